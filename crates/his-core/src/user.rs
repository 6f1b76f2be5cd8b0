//! Workstation roles and the signed-in user blob.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Role of a signed-in principal. Each role owns exactly one workstation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Nurse,
    Doctor,
    Pharmacy,
    Admin,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Nurse, Role::Doctor, Role::Pharmacy, Role::Admin];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Nurse => "nurse",
            Role::Doctor => "doctor",
            Role::Pharmacy => "pharmacy",
            Role::Admin => "admin",
        }
    }

    /// Path prefix of the workstation this role lands on after login.
    pub fn home_path(self) -> &'static str {
        match self {
            Role::Nurse => "/nurse",
            Role::Doctor => "/doctor",
            Role::Pharmacy => "/pharmacy",
            Role::Admin => "/admin",
        }
    }

    /// Display title of the workstation.
    pub fn workstation(self) -> &'static str {
        match self {
            Role::Nurse => "门诊护士工作台",
            Role::Doctor => "医生诊疗工作台",
            Role::Pharmacy => "药房发药工作台",
            Role::Admin => "后台管理系统",
        }
    }

    /// Case-insensitive comparison against a raw role string from a user blob.
    /// Surrounding whitespace is not ignored.
    pub fn matches(self, raw: &str) -> bool {
        raw.eq_ignore_ascii_case(self.as_str())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        Role::ALL
            .into_iter()
            .find(|role| role.matches(trimmed))
            .ok_or_else(|| CoreError::invalid_role(s))
    }
}

/// User information stored next to the session token.
///
/// The role is kept as the raw string the backend issued; use [`User::role`]
/// to interpret it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub role: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dept: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_id: Option<i64>,
}

impl User {
    pub fn new(role: Role, name: impl Into<String>) -> Self {
        Self {
            role: role.as_str().to_string(),
            name: name.into(),
            dept: None,
            user_id: None,
            related_id: None,
        }
    }

    pub fn with_dept(mut self, dept: impl Into<String>) -> Self {
        self.dept = Some(dept.into());
        self
    }

    pub fn with_ids(mut self, user_id: Option<i64>, related_id: Option<i64>) -> Self {
        self.user_id = user_id;
        self.related_id = related_id;
        self
    }

    /// Parsed role, or `None` if the stored string names no known role.
    pub fn role(&self) -> Option<Role> {
        self.role.parse().ok()
    }
}
