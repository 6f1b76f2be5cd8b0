use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Notification severity, mapped to the toast colour by the view layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Success,
    Warn,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warn => "warn",
            Severity::Error => "error",
        }
    }
}

/// A message currently shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Toast {
    pub id: u64,
    #[serde(rename = "type")]
    pub severity: Severity,
    pub message: String,

    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
