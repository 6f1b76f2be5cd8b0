//! Session guard for role-protected workstation paths.
//!
//! An evaluation answers "may the current session render this path?". It
//! proceeds in three steps:
//!
//! 1. No token: denied at once, without any remote call.
//! 2. Token liveness: answered from the [`ValidationCache`] when a positive
//!    result for the same token is younger than the cache window, otherwise
//!    by the [`SessionValidator`]. At most one remote call is in flight at any
//!    time; evaluations for the same token share it, evaluations for another
//!    token wait for it to finish first. A negative answer or an error
//!    discards the session.
//! 3. Role check against the [`AccessTable`]. A mismatch raises a
//!    notification and discards the session.
//!
//! Evaluations started through [`SessionGuard::start`] can be superseded:
//! when their [`Relevance`] lapses while the liveness check is outstanding,
//! the result is dropped with no cache write and no side effect.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use his_core::Role;
use his_notifications::{Notifier, Severity};
use parking_lot::Mutex;

use crate::AuthResult;
use crate::access::AccessTable;
use crate::cache::{CacheStats, ValidationCache};
use crate::config::GuardConfig;
use crate::error::AuthError;
use crate::remote::SessionValidator;
use crate::session::SessionAccess;

/// Shown when a signed-in user opens another role's workstation.
pub const ROLE_VIOLATION_MESSAGE: &str = "无权访问该工作台，请使用对应角色账号登录";

/// Terminal outcome of one evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Authorized,
    Denied(Denial),
}

impl GuardDecision {
    pub fn is_authorized(&self) -> bool {
        matches!(self, GuardDecision::Authorized)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    pub reason: DenyReason,
    pub redirect: LoginRedirect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// No session token at all.
    MissingToken,
    /// The backend rejected the token, or could not be asked.
    InvalidSession,
    /// The path belongs to another role's workstation.
    Forbidden { required: Role },
}

/// Where a denied navigation goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRedirect {
    pub location: String,
    /// The denied path, for returning after login.
    pub from: Option<String>,
}

impl LoginRedirect {
    /// `/login?from=%2Fnurse` style URI.
    pub fn to_uri(&self) -> String {
        match &self.from {
            Some(from) => {
                let encoded: String = url::form_urlencoded::byte_serialize(from.as_bytes()).collect();
                format!("{}?from={}", self.location, encoded)
            }
            None => self.location.clone(),
        }
    }
}

/// Liveness flag of one evaluation.
///
/// Obtained from a [`RelevanceScope`]; lapses when the scope is invalidated.
#[derive(Debug, Clone)]
pub struct Relevance {
    current: Arc<AtomicU64>,
    commit: Arc<Mutex<()>>,
    epoch: u64,
}

impl Relevance {
    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::Acquire) == self.epoch
    }

    /// Runs `apply` only if still current. [`RelevanceScope::invalidate`]
    /// cannot complete while `apply` runs.
    pub fn commit<T>(&self, apply: impl FnOnce() -> T) -> Option<T> {
        let _commit = self.commit.lock();
        self.is_current().then(apply)
    }
}

/// Issues [`Relevance`] tickets and invalidates all of them at once.
#[derive(Debug, Default)]
pub struct RelevanceScope {
    current: Arc<AtomicU64>,
    commit: Arc<Mutex<()>>,
}

impl RelevanceScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ticket(&self) -> Relevance {
        Relevance {
            current: Arc::clone(&self.current),
            commit: Arc::clone(&self.commit),
            epoch: self.current.load(Ordering::Acquire),
        }
    }

    /// Every ticket issued so far stops being current. Waits for a
    /// [`Relevance::commit`] in progress to finish.
    pub fn invalidate(&self) {
        let _commit = self.commit.lock();
        self.current.fetch_add(1, Ordering::AcqRel);
    }
}

/// First, synchronous step of an evaluation.
#[derive(Debug)]
pub enum Evaluation {
    Settled(GuardDecision),
    Pending(PendingCheck),
}

/// An evaluation waiting for the liveness check.
#[derive(Debug, Clone)]
pub struct PendingCheck {
    token: String,
    path: String,
}

impl PendingCheck {
    pub fn path(&self) -> &str {
        &self.path
    }
}

enum Liveness {
    Cached,
    Checked(AuthResult<bool>),
}

type RemoteCheck = Shared<BoxFuture<'static, AuthResult<bool>>>;

struct InFlight {
    id: u64,
    token: String,
    check: RemoteCheck,
}

enum Flight {
    Joined,
    Waiting,
}

pub struct SessionGuard {
    session: Arc<dyn SessionAccess>,
    validator: Arc<dyn SessionValidator>,
    notifier: Arc<dyn Notifier>,
    access: AccessTable,
    cache: Mutex<ValidationCache>,
    in_flight: Arc<Mutex<Option<InFlight>>>,
    next_flight: AtomicU64,
    login_path: String,
    remember_denied_path: bool,
}

impl SessionGuard {
    pub fn new(
        session: Arc<dyn SessionAccess>,
        validator: Arc<dyn SessionValidator>,
        notifier: Arc<dyn Notifier>,
        config: &GuardConfig,
    ) -> Self {
        Self {
            session,
            validator,
            notifier,
            access: AccessTable::new(config.routes.clone()),
            cache: Mutex::new(ValidationCache::new(config.cache_window)),
            in_flight: Arc::new(Mutex::new(None)),
            next_flight: AtomicU64::new(0),
            login_path: config.login_path.clone(),
            remember_denied_path: config.remember_denied_path,
        }
    }

    pub fn current_token(&self) -> Option<String> {
        self.session.token()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.lock().stats()
    }

    /// Runs a full evaluation of `path` for the current session.
    pub async fn evaluate(&self, path: &str) -> GuardDecision {
        match self.start(path) {
            Evaluation::Settled(decision) => decision,
            Evaluation::Pending(check) => {
                let liveness = self.liveness(&check.token).await;
                self.settle(&check, liveness)
            }
        }
    }

    /// Synchronous part of an evaluation: settles at once when there is no
    /// token, otherwise returns the check to hand to [`SessionGuard::resume`].
    pub fn start(&self, path: &str) -> Evaluation {
        match self.session.token() {
            Some(token) => Evaluation::Pending(PendingCheck {
                token,
                path: path.to_owned(),
            }),
            None => {
                self.cache.lock().reset();
                tracing::debug!(path, "No session token");
                Evaluation::Settled(self.deny(path, DenyReason::MissingToken))
            }
        }
    }

    /// Completes a pending evaluation. Returns `None`, having touched
    /// nothing, if `relevance` lapsed while the liveness check was running.
    pub async fn resume(&self, check: PendingCheck, relevance: &Relevance) -> Option<GuardDecision> {
        let liveness = self.liveness(&check.token).await;
        let decision = relevance.commit(|| self.settle(&check, liveness));
        if decision.is_none() {
            tracing::debug!(path = %check.path, "Dropping superseded evaluation");
        }
        decision
    }

    async fn liveness(&self, token: &str) -> Liveness {
        let fresh = self.cache.lock().is_fresh(token);
        if fresh {
            return Liveness::Cached;
        }
        Liveness::Checked(self.check_remote(token).await)
    }

    fn settle(&self, check: &PendingCheck, liveness: Liveness) -> GuardDecision {
        match liveness {
            Liveness::Cached => {
                tracing::debug!(path = %check.path, "Session valid (cached)");
            }
            Liveness::Checked(Ok(true)) => {
                self.cache.lock().record_valid(&check.token);
                tracing::debug!(path = %check.path, "Session valid");
            }
            Liveness::Checked(Ok(false)) => {
                tracing::info!(path = %check.path, "Session rejected by server");
                self.discard_session();
                return self.deny(&check.path, DenyReason::InvalidSession);
            }
            Liveness::Checked(Err(e)) => {
                tracing::warn!(path = %check.path, error = %e, "Session validation failed");
                self.discard_session();
                return self.deny(&check.path, DenyReason::InvalidSession);
            }
        }

        let role = self.session.user_role();
        match self.access.authorize(&check.path, role.as_deref()) {
            Ok(()) => {
                tracing::debug!(path = %check.path, "Access granted");
                GuardDecision::Authorized
            }
            Err(required) => {
                tracing::info!(
                    path = %check.path,
                    role = role.as_deref().unwrap_or("<none>"),
                    required = %required,
                    "Role not permitted for workstation"
                );
                self.notifier.notify(ROLE_VIOLATION_MESSAGE, Severity::Error);
                self.discard_session();
                self.deny(&check.path, DenyReason::Forbidden { required })
            }
        }
    }

    fn discard_session(&self) {
        self.session.discard();
        self.cache.lock().reset();
    }

    fn deny(&self, path: &str, reason: DenyReason) -> GuardDecision {
        GuardDecision::Denied(Denial {
            reason,
            redirect: LoginRedirect {
                location: self.login_path.clone(),
                from: self.remember_denied_path.then(|| path.to_owned()),
            },
        })
    }

    async fn check_remote(&self, token: &str) -> AuthResult<bool> {
        loop {
            let (flight, check) = {
                let mut slot = self.in_flight.lock();
                let existing = slot
                    .as_ref()
                    .map(|current| (current.token == token, current.check.clone()));
                match existing {
                    Some((true, check)) => (Flight::Joined, check),
                    Some((false, check)) => (Flight::Waiting, check),
                    None => {
                        let launched = self.launch(token);
                        let check = launched.check.clone();
                        *slot = Some(launched);
                        (Flight::Joined, check)
                    }
                }
            };

            let result = check.await;
            match flight {
                Flight::Joined => return result,
                Flight::Waiting => {
                    tracing::trace!("Previous validation finished, retrying");
                }
            }
        }
    }

    // Called with the in-flight slot locked. Whichever of the task and the
    // shared check finishes first clears the slot, so a panicking validator
    // cannot leave a finished check behind.
    fn launch(&self, token: &str) -> InFlight {
        let id = self.next_flight.fetch_add(1, Ordering::Relaxed);
        let validator = Arc::clone(&self.validator);
        let owned = token.to_owned();

        let task_slot = Arc::clone(&self.in_flight);
        let task = tokio::spawn(async move {
            let result = validator.validate(&owned).await;
            clear_flight(&task_slot, id);
            result
        });

        let check_slot = Arc::clone(&self.in_flight);
        let check = async move {
            let result = task.await.unwrap_or_else(|e| {
                Err(AuthError::internal(format!("validation task failed: {e}")))
            });
            clear_flight(&check_slot, id);
            result
        }
        .boxed()
        .shared();

        InFlight {
            id,
            token: token.to_owned(),
            check,
        }
    }
}

fn clear_flight(slot: &Mutex<Option<InFlight>>, id: u64) {
    let mut slot = slot.lock();
    if slot.as_ref().is_some_and(|f| f.id == id) {
        *slot = None;
    }
}
