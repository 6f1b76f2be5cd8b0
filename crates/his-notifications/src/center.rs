//! In-memory toast store.
//!
//! Toasts are appended in arrival order and, when a tokio runtime is
//! available, removed automatically once their lifetime elapses.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use time::OffsetDateTime;

use crate::error::NotificationError;
use crate::types::{Severity, Toast};
use crate::Notifier;

/// How long a toast stays visible before it is dismissed automatically.
pub const DEFAULT_TOAST_LIFETIME: Duration = Duration::from_millis(4500);

pub struct ToastCenter {
    toasts: Arc<Mutex<Vec<Toast>>>,
    next_id: AtomicU64,
    lifetime: Option<Duration>,
}

impl ToastCenter {
    pub fn new() -> Self {
        Self::with_lifetime(Some(DEFAULT_TOAST_LIFETIME))
    }

    /// `None` keeps toasts until they are dismissed or drained.
    pub fn with_lifetime(lifetime: Option<Duration>) -> Self {
        Self {
            toasts: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicU64::new(1),
            lifetime,
        }
    }

    /// Shows a toast and returns its id.
    pub fn push(&self, message: impl Into<String>, severity: Severity) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let toast = Toast {
            id,
            severity,
            message: message.into(),
            created_at: OffsetDateTime::now_utc(),
        };
        tracing::debug!(id, severity = severity.as_str(), message = %toast.message, "Toast shown");
        self.toasts.lock().push(toast);

        if let Some(lifetime) = self.lifetime {
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    let toasts = Arc::clone(&self.toasts);
                    handle.spawn(async move {
                        tokio::time::sleep(lifetime).await;
                        toasts.lock().retain(|t| t.id != id);
                    });
                }
                Err(_) => {
                    tracing::trace!(id, "No runtime available; toast stays until dismissed");
                }
            }
        }

        id
    }

    /// Removes a toast before its lifetime elapses.
    pub fn dismiss(&self, id: u64) -> Result<Toast, NotificationError> {
        let mut toasts = self.toasts.lock();
        let index = toasts
            .iter()
            .position(|t| t.id == id)
            .ok_or(NotificationError::NotFound(id))?;
        Ok(toasts.remove(index))
    }

    /// Toasts currently visible, oldest first.
    pub fn list(&self) -> Vec<Toast> {
        self.toasts.lock().clone()
    }

    /// Removes and returns every visible toast.
    pub fn drain(&self) -> Vec<Toast> {
        std::mem::take(&mut *self.toasts.lock())
    }

    pub fn len(&self) -> usize {
        self.toasts.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.lock().is_empty()
    }
}

impl Default for ToastCenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for ToastCenter {
    fn notify(&self, message: &str, severity: Severity) {
        self.push(message, severity);
    }
}
