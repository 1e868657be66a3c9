//! Error types for stig-consolidate.
//!
//! Data-quality problems in tool output never surface here: adapters and the
//! merge orchestrator downgrade them to diagnostic messages. What remains are
//! true I/O failures, configuration errors and contract violations, which are
//! always propagated to the caller.

use crate::config::ConfigError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// File-system operation named in [`ConsolidateError::Io`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOperation {
    Read,
    Write,
    Create,
    /// Enumerating a results directory.
    List,
}

impl IoOperation {
    /// Verb used in error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Create => "create",
            Self::List => "list",
        }
    }
}

impl fmt::Display for IoOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified error type for all stig-consolidate operations.
#[derive(Error, Debug)]
pub enum ConsolidateError {
    /// I/O operation failed.
    #[error("Failed to {operation} {path}: {source}")]
    Io {
        path: PathBuf,
        operation: IoOperation,
        #[source]
        source: std::io::Error,
    },

    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Path is not a directory.
    #[error("Path is not a directory: {0}")]
    NotADirectory(PathBuf),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A collaborator broke an invariant the core relies on.
    #[error("Contract violation: {0}")]
    ContractViolation(String),
}

impl ConsolidateError {
    /// Create an I/O read error.
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            operation: IoOperation::Read,
            source,
        }
    }

    /// Create an I/O write error.
    pub fn write_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            operation: IoOperation::Write,
            source,
        }
    }

    /// Create an I/O directory creation error.
    pub fn create_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            operation: IoOperation::Create,
            source,
        }
    }

    /// Create a directory listing error.
    pub fn list_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            operation: IoOperation::List,
            source,
        }
    }
}

/// Result type alias for stig-consolidate operations.
pub type Result<T> = std::result::Result<T, ConsolidateError>;
