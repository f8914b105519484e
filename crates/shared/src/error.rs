//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// A refused request: the stable rule code plus a readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// Stable machine-readable code, e.g. `FUND_MIXING_VIOLATION`.
    pub code: &'static str,
    /// Human-readable message.
    pub message: String,
}

impl Rejection {
    /// Creates a rejection.
    #[must_use]
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Errors as seen by callers outside the ledger.
///
/// Ledger rule violations keep their own code; storage failures are opaque.
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(Rejection),

    /// Malformed input.
    #[error("Validation error: {0}")]
    Validation(Rejection),

    /// Ledger rule violation.
    #[error("Business rule violation: {0}")]
    BusinessRule(Rejection),

    /// Conflicts with stored state (duplicate code, locked entry).
    #[error("Conflict: {0}")]
    Conflict(Rejection),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::BusinessRule(_) => 422,
            Self::Conflict(_) => 409,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(r) | Self::Validation(r) | Self::BusinessRule(r) | Self::Conflict(r) => {
                r.code
            }
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true for errors caused by the caller's input rather than the system.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AppError::NotFound(Rejection::new("ENTRY_NOT_FOUND", "")), 404, "ENTRY_NOT_FOUND")]
    #[case(AppError::Validation(Rejection::new("INVALID_LINE", "")), 400, "INVALID_LINE")]
    #[case(
        AppError::BusinessRule(Rejection::new("UNBALANCED_ENTRY", "")),
        422,
        "UNBALANCED_ENTRY"
    )]
    #[case(AppError::Conflict(Rejection::new("DUPLICATE_CODE", "")), 409, "DUPLICATE_CODE")]
    #[case(AppError::Database(String::new()), 500, "DATABASE_ERROR")]
    #[case(AppError::Internal(String::new()), 500, "INTERNAL_ERROR")]
    fn test_status_and_code(#[case] error: AppError, #[case] status: u16, #[case] code: &str) {
        assert_eq!(error.status_code(), status);
        assert_eq!(error.error_code(), code);
        assert_eq!(error.is_client_error(), status < 500);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            AppError::NotFound(Rejection::new("ENTRY_NOT_FOUND", "entry RCP-2025-001"))
                .to_string(),
            "Not found: entry RCP-2025-001"
        );
        assert_eq!(
            AppError::Database("connection reset".into()).to_string(),
            "Database error: connection reset"
        );
    }
}
