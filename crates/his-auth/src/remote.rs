//! Remote session liveness check.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use url::Url;

use crate::AuthResult;
use crate::config::RemoteConfig;
use crate::error::AuthError;

/// Asks the backend whether a token still identifies a live session.
///
/// `Ok(false)` means the backend rejected the token; `Err` means no answer
/// could be obtained. Callers deciding access treat both as invalid.
#[async_trait]
pub trait SessionValidator: Send + Sync {
    async fn validate(&self, token: &str) -> AuthResult<bool>;
}

#[derive(Debug, Deserialize)]
struct ValidateResponse {
    valid: Option<bool>,
}

/// Validates tokens against `GET {base}{validate_path}` with a bearer header.
#[derive(Debug, Clone)]
pub struct HttpSessionValidator {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpSessionValidator {
    pub fn new(base_url: &str, config: &RemoteConfig) -> AuthResult<Self> {
        let endpoint = endpoint_url(base_url, &config.validate_path)?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AuthError::configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

fn endpoint_url(base_url: &str, validate_path: &str) -> AuthResult<Url> {
    let mut base = Url::parse(base_url)
        .map_err(|e| AuthError::configuration(format!("invalid server URL '{base_url}': {e}")))?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(validate_path.trim_start_matches('/')).map_err(|e| {
        AuthError::configuration(format!("invalid validation path '{validate_path}': {e}"))
    })
}

#[async_trait]
impl SessionValidator for HttpSessionValidator {
    async fn validate(&self, token: &str) -> AuthResult<bool> {
        tracing::debug!(endpoint = %self.endpoint, "Validating session remotely");

        let response = self
            .client
            .get(self.endpoint.clone())
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AuthError::remote(format!("request failed: {e}")))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Ok(false);
        }
        if !status.is_success() {
            return Err(AuthError::remote(format!("unexpected status {status}")));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AuthError::remote(format!("failed to read response: {e}")))?;
        // Any 2xx without an explicit `"valid": false` counts as valid.
        let valid = serde_json::from_slice::<ValidateResponse>(&body)
            .ok()
            .and_then(|r| r.valid)
            .unwrap_or(true);
        Ok(valid)
    }
}
