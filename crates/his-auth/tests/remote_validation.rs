//! End-to-end tests of the HTTP session validator and the guard using it.

use std::sync::Arc;
use std::time::Duration;

use his_auth::{
    AuthError, DenyReason, GuardConfig, GuardDecision, HttpSessionValidator, RemoteConfig,
    SessionGuard, SessionStore, SessionValidator,
};
use his_core::{Role, User};
use his_notifications::ToastCenter;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const VALIDATE_PATH: &str = "/api/auth/validate";

fn validator(server: &MockServer) -> HttpSessionValidator {
    HttpSessionValidator::new(&server.uri(), &RemoteConfig::default()).unwrap()
}

#[tokio::test]
async fn test_success_without_body_is_valid() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(VALIDATE_PATH))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(validator(&server).validate("tok-1").await, Ok(true));
}

#[tokio::test]
async fn test_explicit_invalid_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(VALIDATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "valid": false })))
        .mount(&server)
        .await;

    assert_eq!(validator(&server).validate("tok").await, Ok(false));
}

#[tokio::test]
async fn test_unauthorized_is_invalid() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(VALIDATE_PATH))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    assert_eq!(validator(&server).validate("tok").await, Ok(false));
}

#[tokio::test]
async fn test_server_error_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(VALIDATE_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = validator(&server).validate("tok").await;
    assert!(matches!(result, Err(AuthError::Remote { .. })));
}

#[tokio::test]
async fn test_timeout_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(VALIDATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let config = RemoteConfig {
        timeout: Duration::from_millis(50),
        ..RemoteConfig::default()
    };
    let validator = HttpSessionValidator::new(&server.uri(), &config).unwrap();
    assert!(validator.validate("tok").await.is_err());
}

fn guard_for(server: &MockServer, store: Arc<SessionStore>, toasts: Arc<ToastCenter>) -> SessionGuard {
    SessionGuard::new(store, Arc::new(validator(server)), toasts, &GuardConfig::default())
}

#[tokio::test]
async fn test_guard_caches_successful_validation() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(VALIDATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "valid": true })))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(SessionStore::new());
    store.login("tok", User::new(Role::Pharmacy, "赵药师"));
    let guard = guard_for(&server, store.clone(), Arc::new(ToastCenter::with_lifetime(None)));

    assert_eq!(guard.evaluate("/pharmacy").await, GuardDecision::Authorized);
    assert_eq!(guard.evaluate("/pharmacy/dispense").await, GuardDecision::Authorized);
}

#[tokio::test]
async fn test_guard_fails_closed_when_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(VALIDATE_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let store = Arc::new(SessionStore::new());
    store.login("tok", User::new(Role::Admin, "管理员"));
    let toasts = Arc::new(ToastCenter::with_lifetime(None));
    let guard = guard_for(&server, store.clone(), toasts.clone());

    let GuardDecision::Denied(denial) = guard.evaluate("/admin").await else {
        panic!("expected denial");
    };
    assert_eq!(denial.reason, DenyReason::InvalidSession);
    assert!(store.token().is_none());
    assert!(toasts.is_empty());
}

#[tokio::test]
async fn test_guard_fails_closed_when_server_is_down() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let store = Arc::new(SessionStore::new());
    store.login("tok", User::new(Role::Nurse, "王护士"));
    let validator = HttpSessionValidator::new(&uri, &RemoteConfig::default()).unwrap();
    let guard = SessionGuard::new(
        store.clone(),
        Arc::new(validator),
        Arc::new(ToastCenter::with_lifetime(None)),
        &GuardConfig::default(),
    );

    assert!(!guard.evaluate("/nurse").await.is_authorized());
    assert!(store.token().is_none());
}
