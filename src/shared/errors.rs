//! Error handling for the application

use thiserror::Error;

use crate::shared::types::WILDCARD;

/// Per-site service errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Service {0} is already closed")]
    AlreadyClosed(String),

    #[error("Service {site} failed to close: {reason}")]
    CloseFailed { site: String, reason: String },

    #[error("Service {0} is not available")]
    Unavailable(String),

    /// Failures of a composite service that closes several sites at once.
    #[error("{0}")]
    Shutdown(ShutdownError),
}

impl ServiceError {
    /// Site the failure originated from.
    pub fn site(&self) -> &str {
        match self {
            ServiceError::AlreadyClosed(site) => site,
            ServiceError::CloseFailed { site, .. } => site,
            ServiceError::Unavailable(site) => site,
            ServiceError::Shutdown(_) => WILDCARD,
        }
    }
}

/// Aggregate failure raised once every registered service has been given a chance to close.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to close context(s): {}", describe(.failures))]
pub struct ShutdownError {
    pub failures: Vec<ServiceError>,
}

fn describe(failures: &[ServiceError]) -> String {
    failures
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// General application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Snapshot error: {0}")]
    SnapshotError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Shutdown error: {0}")]
    Shutdown(#[from] ShutdownError),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Shutdown(shutdown) => AppError::Shutdown(shutdown),
            other => AppError::Shutdown(ShutdownError {
                failures: vec![other],
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shutdown_error_lists_every_failure() {
        let err = ShutdownError {
            failures: vec![
                ServiceError::AlreadyClosed("bf".to_string()),
                ServiceError::CloseFailed {
                    site: "cc".to_string(),
                    reason: "socket".to_string(),
                },
            ],
        };

        let message = err.to_string();
        assert!(message.contains("bf is already closed"));
        assert!(message.contains("cc failed to close: socket"));
        assert_eq!(err.failures[1].site(), "cc");
    }

    #[test]
    fn test_nested_shutdown_keeps_failures() {
        let nested = ServiceError::Shutdown(ShutdownError {
            failures: vec![
                ServiceError::AlreadyClosed("bf".to_string()),
                ServiceError::Unavailable("cc".to_string()),
            ],
        });
        assert_eq!(nested.site(), WILDCARD);

        match AppError::from(nested) {
            AppError::Shutdown(e) => {
                assert_eq!(e.failures.len(), 2);
                assert_eq!(e.failures[0].site(), "bf");
                assert_eq!(e.failures[1].site(), "cc");
            }
            other => panic!("unexpected {:?}", other),
        }

        match AppError::from(ServiceError::AlreadyClosed("bf".to_string())) {
            AppError::Shutdown(e) => assert_eq!(e.failures.len(), 1),
            other => panic!("unexpected {:?}", other),
        }
    }
}
