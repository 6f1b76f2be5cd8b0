//! Static path-prefix to role table.

use his_core::Role;
use serde::{Deserialize, Serialize};

/// One work area: every path under `prefix` requires `role`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRule {
    pub prefix: String,
    pub role: Role,
}

impl RouteRule {
    pub fn new(prefix: impl Into<String>, role: Role) -> Self {
        Self {
            prefix: prefix.into(),
            role,
        }
    }

    /// Segment-aware prefix match: `/nurse` covers `/nurse` and
    /// `/nurse/queue` but not `/nursery`.
    pub fn covers(&self, path: &str) -> bool {
        let path = strip_query(path);
        match path.strip_prefix(self.prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

/// The default work areas, one per role.
pub fn default_routes() -> Vec<RouteRule> {
    Role::ALL
        .iter()
        .map(|role| RouteRule::new(role.home_path(), *role))
        .collect()
}

fn strip_query(path: &str) -> &str {
    match path.find(['?', '#']) {
        Some(end) => &path[..end],
        None => path,
    }
}

#[derive(Debug, Clone)]
pub struct AccessTable {
    rules: Vec<RouteRule>,
}

impl AccessTable {
    pub fn new(rules: Vec<RouteRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    /// The rule restricting `path`, if any.
    pub fn lookup(&self, path: &str) -> Option<&RouteRule> {
        self.rules.iter().find(|rule| rule.covers(path))
    }

    /// Checks `user_role` against the rule covering `path`.
    ///
    /// Unrestricted paths accept any role, including none. On a mismatch the
    /// required role is returned.
    pub fn authorize(&self, path: &str, user_role: Option<&str>) -> Result<(), Role> {
        let Some(rule) = self.lookup(path) else {
            return Ok(());
        };
        match user_role {
            Some(raw) if rule.role.matches(raw) => Ok(()),
            _ => Err(rule.role),
        }
    }
}

impl Default for AccessTable {
    fn default() -> Self {
        Self::new(default_routes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_has_one_entry_per_role() {
        let table = AccessTable::default();
        assert_eq!(table.rules().len(), 4);
        assert_eq!(table.lookup("/nurse").map(|r| r.role), Some(Role::Nurse));
        assert_eq!(table.lookup("/doctor").map(|r| r.role), Some(Role::Doctor));
        assert_eq!(
            table.lookup("/pharmacy").map(|r| r.role),
            Some(Role::Pharmacy)
        );
        assert_eq!(table.lookup("/admin").map(|r| r.role), Some(Role::Admin));
    }

    #[test]
    fn test_prefix_match_is_segment_aware() {
        let rule = RouteRule::new("/nurse", Role::Nurse);
        assert!(rule.covers("/nurse"));
        assert!(rule.covers("/nurse/"));
        assert!(rule.covers("/nurse/registration/42"));
        assert!(rule.covers("/nurse?tab=charge"));
        assert!(!rule.covers("/nursery"));
        assert!(!rule.covers("/"));
        assert!(!rule.covers("/doctor/nurse"));
    }

    #[test]
    fn test_authorize() {
        let table = AccessTable::default();
        assert_eq!(table.authorize("/nurse/queue", Some("nurse")), Ok(()));
        assert_eq!(table.authorize("/nurse/queue", Some("NURSE")), Ok(()));
        assert_eq!(
            table.authorize("/nurse/queue", Some("doctor")),
            Err(Role::Nurse)
        );
        assert_eq!(table.authorize("/admin", None), Err(Role::Admin));
        assert_eq!(
            table.authorize("/nurse/queue", Some(" nurse ")),
            Err(Role::Nurse)
        );
    }

    #[test]
    fn test_unrestricted_paths_accept_any_role() {
        let table = AccessTable::default();
        assert_eq!(table.authorize("/", Some("doctor")), Ok(()));
        assert_eq!(table.authorize("/profile", None), Ok(()));
    }

    #[test]
    fn test_unknown_role_is_rejected_on_restricted_path() {
        let table = AccessTable::default();
        assert_eq!(
            table.authorize("/pharmacy", Some("janitor")),
            Err(Role::Pharmacy)
        );
    }
}
