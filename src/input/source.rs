//! Report source abstraction.

use crate::error::{ConsolidateError, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Synchronous read access to raw tool reports.
///
/// Adapters read through this trait so tests can substitute fixtures
/// without touching the file system.
pub trait ReportSource: Send + Sync {
    /// Read the full content of a report.
    fn read_to_string(&self, path: &Path) -> Result<String>;
}

/// Reads reports from the local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSystemSource;

impl FileSystemSource {
    /// Create a file-system source.
    pub fn new() -> Self {
        Self
    }
}

impl ReportSource for FileSystemSource {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        if !path.exists() {
            return Err(ConsolidateError::FileNotFound(path.to_path_buf()));
        }
        let bytes = fs::read(path).map_err(|e| ConsolidateError::read_error(path, e))?;
        // Tool exports are not always valid UTF-8 (legacy CKL files are
        // frequently Windows-1252); keep going with replacement characters.
        Ok(String::from_utf8(bytes)
            .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned()))
    }
}

/// Serves reports from memory, keyed by path.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    files: HashMap<PathBuf, String>,
}

impl InMemorySource {
    /// Create an empty in-memory source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a report at `path`.
    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }

    /// Add or replace the report at `path`.
    pub fn insert(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }
}

impl ReportSource for InMemorySource {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| ConsolidateError::FileNotFound(path.to_path_buf()))
    }
}
