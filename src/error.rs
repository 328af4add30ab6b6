//! Unified error types for the workspace allocator.
//!
//! [`WorkspaceError`] covers every failure the allocator can report. It uses
//! the `thiserror` crate for `Display` and `From` plumbing.
//!
//! # Example
//!
//! ```rust
//! use lga_workspace::{WorkspaceError, WorkspaceResult};
//!
//! fn require_slot(present: bool) -> WorkspaceResult<()> {
//!     if !present {
//!         return Err(WorkspaceError::invalid_argument("workspace slot is null"));
//!     }
//!     Ok(())
//! }
//!
//! assert!(require_slot(false).is_err());
//! ```

use thiserror::Error;

use crate::config::ConfigError;

/// Status returned to C callers on success.
pub const STATUS_OK: i32 = 0;

/// Unified error type for workspace operations.
#[derive(Error, Debug)]
pub enum WorkspaceError {
    /// The caller passed a malformed slot reference.
    ///
    /// Detected before any allocation takes place; nothing is acquired.
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// At least one buffer allocation failed.
    ///
    /// Every buffer acquired before the failure has already been released
    /// by the time this error is observed. The failing buffer is not named.
    #[error("Workspace allocation failed")]
    AllocationFailure,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Integer overflow in buffer size calculations.
    #[error("Integer overflow: {0}")]
    Overflow(String),
}

/// Result type alias for workspace operations.
pub type WorkspaceResult<T> = Result<T, WorkspaceError>;

impl WorkspaceError {
    /// Creates an invalid argument error.
    pub fn invalid_argument(what: &'static str) -> Self {
        WorkspaceError::InvalidArgument(what)
    }

    /// Creates an overflow error.
    pub fn overflow<S: Into<String>>(msg: S) -> Self {
        WorkspaceError::Overflow(msg.into())
    }

    /// C-style status code for this error.
    ///
    /// Success is [`STATUS_OK`]; every error maps to a distinct negative
    /// value so C callers can keep testing `status != 0`.
    pub fn status_code(&self) -> i32 {
        match self {
            WorkspaceError::InvalidArgument(_) => -1,
            WorkspaceError::AllocationFailure => -2,
            WorkspaceError::Config(_) => -3,
            WorkspaceError::Overflow(_) => -4,
        }
    }
}

/// Collapses a result into a C-style status code.
#[inline]
pub fn status_of<T>(result: &WorkspaceResult<T>) -> i32 {
    match result {
        Ok(_) => STATUS_OK,
        Err(err) => err.status_code(),
    }
}
