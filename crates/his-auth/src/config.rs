//! Session guard configuration.
//!
//! Every section falls back to its defaults when omitted, so an empty
//! document is a valid configuration.
//!
//! # Example (TOML)
//!
//! ```toml
//! [guard]
//! cache_window = "20s"
//! login_path = "/login"
//!
//! [[guard.routes]]
//! prefix = "/nurse"
//! role = "nurse"
//!
//! [remote]
//! validate_path = "/api/auth/validate"
//! timeout = "5s"
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::access::{RouteRule, default_routes};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Route guard behaviour.
    pub guard: GuardConfig,

    /// Remote session validation endpoint.
    pub remote: RemoteConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GuardConfig {
    /// How long a successful remote validation is trusted.
    #[serde(with = "humantime_serde")]
    pub cache_window: Duration,

    /// Where denied navigations are redirected.
    pub login_path: String,

    /// Attach the denied path to the login redirect so the user can return
    /// after signing in.
    pub remember_denied_path: bool,

    /// Path prefixes restricted to a single role.
    pub routes: Vec<RouteRule>,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            cache_window: Duration::from_secs(20),
            login_path: "/login".to_string(),
            remember_denied_path: true,
            routes: default_routes(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Path of the validation endpoint, relative to the server base URL.
    pub validate_path: String,

    /// Request timeout for the validation call.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            validate_path: "/api/auth/validate".to_string(),
            timeout: Duration::from_secs(5),
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// A required configuration value is missing.
    #[error("Missing required configuration: {0}")]
    Missing(String),
}

impl AuthConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - The cache window or the remote timeout is zero
    /// - The login path does not start with `/`
    /// - A route prefix does not start with `/` or ends with `/`
    /// - Two route prefixes can match the same path
    ///
    /// Returns `ConfigError::Missing` if the login path or the validation
    /// path is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.guard.cache_window.is_zero() {
            return Err(ConfigError::InvalidValue(
                "guard.cache_window must be greater than zero".into(),
            ));
        }

        if self.guard.login_path.is_empty() {
            return Err(ConfigError::Missing("guard.login_path".into()));
        }
        if !self.guard.login_path.starts_with('/') {
            return Err(ConfigError::InvalidValue(format!(
                "guard.login_path must start with '/': {}",
                self.guard.login_path
            )));
        }

        for rule in &self.guard.routes {
            if !rule.prefix.starts_with('/') || rule.prefix.len() < 2 || rule.prefix.ends_with('/')
            {
                return Err(ConfigError::InvalidValue(format!(
                    "route prefix must look like '/area': {}",
                    rule.prefix
                )));
            }
        }

        for (i, a) in self.guard.routes.iter().enumerate() {
            for b in &self.guard.routes[i + 1..] {
                if a.covers(&b.prefix) || b.covers(&a.prefix) {
                    return Err(ConfigError::InvalidValue(format!(
                        "route prefixes overlap: {} and {}",
                        a.prefix, b.prefix
                    )));
                }
            }
        }

        if self.remote.validate_path.is_empty() {
            return Err(ConfigError::Missing("remote.validate_path".into()));
        }
        if self.remote.timeout.is_zero() {
            return Err(ConfigError::InvalidValue(
                "remote.timeout must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use his_core::Role;

    #[test]
    fn test_default_config_is_valid() {
        let config = AuthConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.guard.cache_window, Duration::from_secs(20));
        assert_eq!(config.guard.login_path, "/login");
        assert!(config.guard.remember_denied_path);
        assert_eq!(config.guard.routes.len(), 4);
        assert_eq!(config.remote.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: AuthConfig = toml::from_str("").unwrap();
        assert_eq!(config.guard.cache_window, Duration::from_secs(20));
        assert_eq!(config.remote.validate_path, "/api/auth/validate");
    }

    #[test]
    fn test_parse_toml() {
        let config: AuthConfig = toml::from_str(
            r#"
            [guard]
            cache_window = "45s"
            remember_denied_path = false

            [[guard.routes]]
            prefix = "/ward"
            role = "nurse"

            [remote]
            timeout = "2s 500ms"
            "#,
        )
        .unwrap();

        assert_eq!(config.guard.cache_window, Duration::from_secs(45));
        assert!(!config.guard.remember_denied_path);
        assert_eq!(config.guard.routes, vec![RouteRule::new("/ward", Role::Nurse)]);
        assert_eq!(config.remote.timeout, Duration::from_millis(2500));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_cache_window_rejected() {
        let mut config = AuthConfig::default();
        config.guard.cache_window = Duration::ZERO;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_login_path_rules() {
        let mut config = AuthConfig::default();
        config.guard.login_path = String::new();
        assert!(matches!(config.validate(), Err(ConfigError::Missing(_))));

        config.guard.login_path = "login".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_malformed_route_prefix_rejected() {
        for prefix in ["nurse", "/", "/nurse/"] {
            let mut config = AuthConfig::default();
            config.guard.routes = vec![RouteRule::new(prefix, Role::Nurse)];
            assert!(config.validate().is_err(), "{prefix}");
        }
    }

    #[test]
    fn test_overlapping_routes_rejected() {
        let mut config = AuthConfig::default();
        config
            .guard
            .routes
            .push(RouteRule::new("/nurse/charge", Role::Admin));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("overlap"));

        let mut config = AuthConfig::default();
        config.guard.routes.push(RouteRule::new("/doctor", Role::Admin));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sibling_prefixes_do_not_overlap() {
        let mut config = AuthConfig::default();
        config.guard.routes.push(RouteRule::new("/nursery", Role::Admin));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_remote_rules() {
        let mut config = AuthConfig::default();
        config.remote.validate_path = String::new();
        assert!(matches!(config.validate(), Err(ConfigError::Missing(_))));

        let mut config = AuthConfig::default();
        config.remote.timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }
}
