// src/errors.rs
// DOCUMENTATION: Custom error types and process exit codes
// PURPOSE: Centralized error handling for entire application

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Application-specific error types
/// DOCUMENTATION: Comprehensive error enum for all possible failures
/// Each variant maps to a process exit code in `main`
#[derive(Error, Debug)]
pub enum PlacesError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Transient upstream failure: {0}")]
    Transient(String),

    #[error("Upstream quota exceeded")]
    QuotaExceeded { retry_after: Option<Duration> },

    #[error("Fetch failed after {attempts} attempts: {message}")]
    Fetch { attempts: u32, message: String },

    #[error("Request budget of {0} API calls exhausted")]
    RequestBudgetExceeded(u32),

    #[error("External API error: {0}")]
    Upstream(String),

    #[error("Could not write {}: {message}", path.display())]
    Io { path: PathBuf, message: String },
}

impl PlacesError {
    /// Whether the pipeline may retry the call that produced this error
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PlacesError::Transient(_) | PlacesError::QuotaExceeded { .. }
        )
    }

    /// Convert PlacesError to a process exit code
    /// DOCUMENTATION: Maps error types to distinct non-zero exit codes
    pub fn exit_code(&self) -> u8 {
        match self {
            PlacesError::InvalidArgument(_) => 2,
            PlacesError::Auth(_) => 3,
            PlacesError::Io { .. } => 4,
            PlacesError::QuotaExceeded { .. } | PlacesError::RequestBudgetExceeded(_) => 5,
            PlacesError::Transient(_) | PlacesError::Fetch { .. } | PlacesError::Upstream(_) => 1,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        PlacesError::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }
}
