//! Application error types.

use calscan_core::TracingError;
use calscan_providers::ProviderError;
use thiserror::Error;

/// Result type for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Errors that stop a command.
///
/// Pipeline stages never produce these; they log and degrade instead. Only
/// configuration problems and a failed authentication end a run early.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded or is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// No valid Google session could be obtained.
    #[error("authentication failed: {0}")]
    Auth(#[source] ProviderError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Logging could not be initialized.
    #[error("logging setup failed: {0}")]
    Logging(#[from] TracingError),
}

impl AppError {
    /// Wraps anything displayable as a configuration error.
    pub fn config(err: impl std::fmt::Display) -> Self {
        Self::Config(err.to_string())
    }
}
