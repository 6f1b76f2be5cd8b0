//! # his-auth
//!
//! Session validation and role-based access control for the HIS
//! workstations.
//!
//! ## Modules
//!
//! - [`guard`] - The session guard: token liveness, validation cache, role check
//! - [`gate`] - Per-navigation driver publishing the guard's state
//! - [`access`] - Path prefix to role table
//! - [`cache`] - Memo of the last successful remote validation
//! - [`session`] - Session store and persistence backends
//! - [`remote`] - Remote liveness check over HTTP
//! - [`config`] - Guard and remote endpoint configuration

pub mod access;
pub mod cache;
pub mod config;
pub mod error;
pub mod gate;
pub mod guard;
pub mod remote;
pub mod session;

pub use access::{AccessTable, RouteRule, default_routes};
pub use cache::{CacheStats, ValidationCache};
pub use config::{AuthConfig, ConfigError, GuardConfig, RemoteConfig};
pub use error::AuthError;
pub use gate::{GateState, RouteGate};
pub use guard::{
    Denial, DenyReason, Evaluation, GuardDecision, LoginRedirect, PendingCheck,
    ROLE_VIOLATION_MESSAGE, Relevance, RelevanceScope, SessionGuard,
};
pub use remote::{HttpSessionValidator, SessionValidator};
pub use session::{
    FileSessionPersistence, MemorySessionPersistence, Session, SessionAccess, SessionPersistence,
    SessionStore,
};

/// Type alias for session and authorization results.
pub type AuthResult<T> = Result<T, AuthError>;
