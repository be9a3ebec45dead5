//! Custom error types for fest.
//!
//! This module provides structured error types that enable better
//! error handling, reporting, and recovery throughout the application.
//!
//! Errors are grouped into categories (not-found, validation, I/O, parse,
//! cancelled) and carry the operation name and relevant field values so
//! callers never see a raw OS error without context.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for fest operations
#[derive(Error, Debug)]
pub enum FestError {
    // =========================================================================
    // Not-Found Errors
    // =========================================================================
    /// A festival, phase, sequence, or task could not be located
    #[error("Not found: {what} at {path}")]
    NotFound { what: String, path: PathBuf },

    /// No stored progress record exists for a task
    #[error("No progress record for task: {task_id}")]
    TaskNotTracked { task_id: String },

    // =========================================================================
    // Validation Errors
    // =========================================================================
    /// A field value failed validation before any mutation occurred
    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    /// A task path resolved outside the festival root
    #[error("Task path escapes festival root: {path}")]
    TaskOutsideFestival { path: PathBuf },

    // =========================================================================
    // Store Errors
    // =========================================================================
    /// Reading or writing the progress record failed
    #[error("Progress store error: {message}")]
    Store {
        message: String,
        path: Option<PathBuf>,
    },

    /// Exclusive access to the progress record could not be acquired
    #[error("Failed to lock progress record: {path}")]
    LockFailed { path: PathBuf },

    // =========================================================================
    // Parse Errors
    // =========================================================================
    /// A document or record payload could not be parsed
    #[error("Parse error in {path}: {detail}")]
    Parse { path: PathBuf, detail: String },

    // =========================================================================
    // Cancellation
    // =========================================================================
    /// The operation was cancelled via the cooperative token
    #[error("Operation cancelled: {operation}")]
    Cancelled { operation: String },

    // =========================================================================
    // Wrapped Errors
    // =========================================================================
    /// IO error wrapper
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON error wrapper
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Coarse classification of an error, matching the propagation policy:
/// fail-safe for reads, fail-hard for writes, immediate for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    NotFound,
    Validation,
    Io,
    Parse,
    Cancelled,
}

impl FestError {
    // =========================================================================
    // Constructor helpers
    // =========================================================================

    /// Create a not-found error
    pub fn not_found(what: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::NotFound {
            what: what.into(),
            path: path.into(),
        }
    }

    /// Create a validation error
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
            path: None,
        }
    }

    /// Create a store error with the backing file path
    pub fn store_with_path(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::Store {
            message: message.into(),
            path: Some(path.into()),
        }
    }

    /// Create a parse error
    pub fn parse(path: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            detail: detail.into(),
        }
    }

    /// Create a cancellation error
    pub fn cancelled(operation: impl Into<String>) -> Self {
        Self::Cancelled {
            operation: operation.into(),
        }
    }

    // =========================================================================
    // Classification helpers
    // =========================================================================

    /// Get the coarse category of this error
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } | Self::TaskNotTracked { .. } => ErrorCategory::NotFound,
            Self::Validation { .. } | Self::TaskOutsideFestival { .. } => ErrorCategory::Validation,
            Self::Store { .. } | Self::LockFailed { .. } | Self::Io(_) => ErrorCategory::Io,
            Self::Parse { .. } | Self::Json(_) => ErrorCategory::Parse,
            Self::Cancelled { .. } => ErrorCategory::Cancelled,
        }
    }

    /// Check if this error is a cancellation
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Check if this error may be swallowed into a safe default on read paths
    #[must_use]
    pub fn is_read_safe(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::NotFound | ErrorCategory::Parse
        )
    }

    /// Get error code for exit status
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Cancelled => 2,
            ErrorCategory::Validation => 3,
            ErrorCategory::NotFound => 4,
            ErrorCategory::Parse => 5,
            ErrorCategory::Io => 6,
        }
    }
}

/// Type alias for fest results
pub type Result<T> = std::result::Result<T, FestError>;
