pub mod center;
pub mod error;
pub mod types;

pub use center::{DEFAULT_TOAST_LIFETIME, ToastCenter};
pub use error::NotificationError;
pub use types::*;

/// Side channel for user-visible messages.
///
/// Implementations must not block: callers fire and forget.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, severity: Severity);
}
