//! Session and authorization error types.

/// Errors raised by the session collaborators.
///
/// The guard itself never returns these to its caller: any error from the
/// remote check is turned into a denial.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// The remote validation endpoint could not be reached or answered
    /// with an unexpected status.
    #[error("Remote validation error: {message}")]
    Remote {
        /// Description of the remote failure.
        message: String,
    },

    /// Reading or writing the persisted session failed.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
    },

    /// The auth configuration is invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },

    /// An unexpected internal error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `Remote` error.
    #[must_use]
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote {
            message: message.into(),
        }
    }

    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<crate::config::ConfigError> for AuthError {
    fn from(err: crate::config::ConfigError) -> Self {
        Self::configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;

    #[test]
    fn test_error_display() {
        assert_eq!(
            AuthError::remote("timed out").to_string(),
            "Remote validation error: timed out"
        );
        assert_eq!(
            AuthError::storage("disk full").to_string(),
            "Storage error: disk full"
        );
    }

    #[test]
    fn test_from_config_error() {
        let err: AuthError = ConfigError::Missing("remote.validate_path".into()).into();
        assert!(matches!(err, AuthError::Configuration { .. }));
        assert!(err.to_string().contains("remote.validate_path"));
    }
}
