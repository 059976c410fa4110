//! Crate-level error type
//!
//! Repository operations report through [`RepositoryError`] and
//! [`Outcome`](crate::repository::Outcome); this type covers the surrounding
//! setup (configuration, logging bootstrap) and wraps repository faults when
//! they are propagated with `?` from application code.

use thiserror::Error;

use crate::repository::RepositoryError;
use crate::store::StoreError;

/// Errors raised outside the repository contract
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    /// Repository fault (store unreachable, unreadable rows)
    #[error("{0}")]
    Repository(#[from] RepositoryError),

    /// Raw store failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Logging could not be initialized
    #[error("Tracing error: {0}")]
    Tracing(String),
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(Box::new(err))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_converts() {
        let error: Error = RepositoryError::connection_failed("offline").into();
        assert!(matches!(error, Error::Repository(_)));
        assert!(error.to_string().contains("connection_failed"));
    }

    #[test]
    fn test_store_error_display() {
        let error: Error = StoreError::Unavailable("offline".to_string()).into();
        assert_eq!(error.to_string(), "Store error: store unavailable: offline");
    }
}
