//! Unified error type for the ledger engine, its stores and the CLI.

use thiserror::Error;

/// Every failure the ledger can report to a caller.
#[derive(Debug, Error)]
pub enum Error {
    /// Input rejected before anything was touched. The caller must fix the input.
    #[error("Validation error: {message}")]
    Validation {
        /// What was wrong with the input
        message: String,
    },

    /// No account identity was supplied with the request.
    #[error("Not authenticated: no account identity was provided")]
    NotAuthenticated,

    /// The account has no ledger yet.
    #[error("Account '{account}' has no ledger")]
    AccountNotFound {
        /// Account identity that was looked up
        account: String,
    },

    /// `open_account` was called for an account that already has a ledger.
    #[error("Account '{account}' already has a ledger")]
    AccountExists {
        /// Account identity that was opened twice
        account: String,
    },

    /// A cycle id that the account never had.
    #[error("Cycle '{cycle_id}' not found")]
    CycleNotFound {
        /// The unknown cycle id
        cycle_id: String,
    },

    /// The backing store failed to load or save. Nothing was committed.
    #[error("Persistence error: {message}")]
    Persistence {
        /// Underlying store failure
        message: String,
    },

    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong while loading configuration
        message: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for building a [`Error::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Only store failures are worth retrying; everything else needs a caller-side fix.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence { .. })
    }
}

impl From<sea_orm::DbErr> for Error {
    fn from(value: sea_orm::DbErr) -> Self {
        Self::Persistence {
            message: value.to_string(),
        }
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_persistence_is_retryable() {
        assert!(
            Error::Persistence {
                message: "disk full".to_string()
            }
            .is_retryable()
        );
        assert!(!Error::validation("amount must be positive").is_retryable());
        assert!(!Error::NotAuthenticated.is_retryable());
    }

    #[test]
    fn test_db_error_maps_to_persistence() {
        let err: Error = sea_orm::DbErr::Custom("locked".to_string()).into();
        assert!(matches!(err, Error::Persistence { .. }));
        assert!(err.to_string().contains("locked"));
    }
}
