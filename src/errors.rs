/*!
 * Error types for the cyrlatin crate.
 *
 * This module contains custom error types for different parts of the crate,
 * using the thiserror crate for ergonomic error definitions.
 */

// Allow dead code - error types are for library consumers
#![allow(dead_code)]

use thiserror::Error;

/// Errors reported by the host content/option store
#[derive(Error, Debug)]
pub enum StoreError {
    /// Transient failure; the operation should be retried on a later tick
    #[error("recoverable store error: {0}")]
    Recoverable(String),

    /// The requested record does not exist
    #[error("record not found: {0}")]
    NotFound(String),

    /// Non-transient backend failure
    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Whether the error is transient and worth retrying on the next tick
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable(_))
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(error: rusqlite::Error) -> Self {
        Self::Backend(error.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(error: serde_json::Error) -> Self {
        Self::Backend(error.to_string())
    }
}

/// Errors that can occur during the background slug conversion
#[derive(Error, Debug)]
pub enum ConversionError {
    /// Error from the host store
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The persisted progress record could not be decoded
    #[error("corrupt progress record: {0}")]
    CorruptProgress(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from the host store
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Error from the background conversion
    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
