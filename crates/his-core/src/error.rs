use thiserror::Error;

/// Core error types for HIS domain values
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid role: {0}")]
    InvalidRole(String),

    #[error("Invalid gender code: {0}")]
    InvalidGender(u8),
}

impl CoreError {
    /// Create a new InvalidRole error
    pub fn invalid_role(role: impl Into<String>) -> Self {
        Self::InvalidRole(role.into())
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::invalid_role("janitor");
        assert_eq!(err.to_string(), "Invalid role: janitor");

        let err = CoreError::InvalidGender(7);
        assert_eq!(err.to_string(), "Invalid gender code: 7");
    }
}
