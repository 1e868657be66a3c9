//! Discovery of tool report files under a results directory.

use crate::config::DiscoveryConfig;
use crate::error::{ConsolidateError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Report files found under a results directory.
#[derive(Debug, Default)]
pub struct DiscoveredReports {
    /// Matching files, sorted by path.
    pub paths: Vec<PathBuf>,
    /// Entries the walk could not enter or read.
    pub skipped: Vec<ConsolidateError>,
}

impl DiscoveredReports {
    /// One diagnostic line per skipped entry.
    pub fn diagnostics(&self) -> Vec<String> {
        self.skipped.iter().map(|e| format!("{e}; skipped")).collect()
    }
}

/// Walk `dir` and collect every file whose extension is listed in the
/// discovery configuration.
///
/// Subdirectories that cannot be listed are recorded in
/// [`DiscoveredReports::skipped`] and the walk continues.
pub fn scan_reports(dir: &Path, config: &DiscoveryConfig) -> Result<DiscoveredReports> {
    if !dir.exists() {
        return Err(ConsolidateError::FileNotFound(dir.to_path_buf()));
    }
    if !dir.is_dir() {
        return Err(ConsolidateError::NotADirectory(dir.to_path_buf()));
    }

    let mut walker = WalkDir::new(dir).follow_links(config.follow_symlinks);
    if let Some(depth) = config.max_depth {
        walker = walker.max_depth(depth);
    }

    let mut found = DiscoveredReports::default();
    for entry in walker {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file() && matches_extension(entry.path(), &config.extensions) {
                    found.paths.push(entry.into_path());
                }
            }
            Err(e) => {
                let path = e.path().unwrap_or(dir).to_path_buf();
                warn!(path = %path.display(), error = %e, "Skipping unreadable directory entry");
                found.skipped.push(ConsolidateError::list_error(path, e.into()));
            }
        }
    }
    found.paths.sort();

    debug!(
        dir = %dir.display(),
        count = found.paths.len(),
        skipped = found.skipped.len(),
        "Discovered report files"
    );
    Ok(found)
}

/// Paths-only form of [`scan_reports`]. Skipped entries are logged.
pub fn discover_reports(dir: &Path, config: &DiscoveryConfig) -> Result<Vec<PathBuf>> {
    scan_reports(dir, config).map(|found| found.paths)
}

fn matches_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}
