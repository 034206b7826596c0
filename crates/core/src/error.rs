// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    /// Initial page load failed; surfaced to the UI with a retry action
    #[error("Failed to load jobs: {0}")]
    Fetch(#[from] crate::port::FeedError),

    /// Event or response referencing data that is no longer current
    #[error("Stale event: {0}")]
    StaleEvent(String),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] crate::port::TelemetryError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl AppError {
    /// Whether a manual retry (`reset`) can clear this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Fetch(_) | AppError::StaleEvent(_))
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
