//! Error types for the admission engine
//!
//! This module provides error types shared by the GateGuard core.

use std::io;
use thiserror::Error;

/// Result type for the admission engine
pub type Result<T> = std::result::Result<T, GuardError>;

/// Error type for the admission engine
#[derive(Debug, Error)]
pub enum GuardError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage backend error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Proxy-detection service error
    #[error("Proxy service error: {0}")]
    ProxyService(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Helper function to convert string errors to GuardError
pub fn to_guard_error<E: ToString>(err: E) -> GuardError {
    GuardError::Other(err.to_string())
}
