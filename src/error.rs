//! Error types for minicask
//!
//! Provides a unified error type for all operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using CaskError
pub type Result<T> = std::result::Result<T, CaskError>;

/// Unified error type for minicask operations
#[derive(Debug, Error)]
pub enum CaskError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid directory {}: {source}", .path.display())]
    InvalidDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Log Errors
    // -------------------------------------------------------------------------
    #[error("Log corruption at offset {offset}: {reason}")]
    Corruption { offset: u64, reason: String },

    #[error("Record too large: {field} is {len} bytes (max {})", u32::MAX)]
    RecordTooLarge { field: &'static str, len: usize },

    // -------------------------------------------------------------------------
    // Key Errors
    // -------------------------------------------------------------------------
    #[error("Key must not be empty")]
    EmptyKey,

    #[error("Key not found")]
    KeyNotFound,

    // -------------------------------------------------------------------------
    // Lifecycle Errors
    // -------------------------------------------------------------------------
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl CaskError {
    /// Build a corruption error for the record starting at `offset`
    pub fn corruption(offset: u64, reason: impl Into<String>) -> Self {
        CaskError::Corruption {
            offset,
            reason: reason.into(),
        }
    }

    /// True if this error reports an undecodable record
    pub fn is_corruption(&self) -> bool {
        matches!(self, CaskError::Corruption { .. })
    }
}
