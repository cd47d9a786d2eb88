//! # AppError
//!
//! Centralized error handling for the Haymarket catalog.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

/// The primary error type for all hm-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., Product, Wood Type)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Validation failure (e.g., empty product name, bad contact form)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Missing or rejected admin session
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Infrastructure failure (e.g., DB down, upload directory not writable)
    #[error("internal service error: {0}")]
    Internal(String),

    /// Rate limit exceeded
    #[error("too many requests: {0}")]
    RateLimitExceeded(String),
}

/// A specialized Result type for catalog logic.
pub type Result<T> = std::result::Result<T, AppError>;
