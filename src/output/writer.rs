//! Artifact writer.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::aggregator::CoverageReport;
use crate::config::OutputConfig;
use crate::error::{ConsolidateError, Result};
use crate::reporter::{CoverageReporter, CsvReporter, JsonReporter, Reporter};
use crate::scap::ScapMappingManifest;
use crate::types::{ConsolidatedVerifyReport, ToolPrecedence};

pub const CONSOLIDATED_JSON: &str = "consolidated-results.json";
pub const CONSOLIDATED_CSV: &str = "consolidated-results.csv";
pub const TOOL_COVERAGE_JSON: &str = "tool-coverage.json";
pub const TOOL_COVERAGE_CSV: &str = "tool-coverage.csv";
pub const COVERAGE_OVERLAP_JSON: &str = "coverage-overlap.json";
pub const COVERAGE_OVERLAP_CSV: &str = "coverage-overlap.csv";
pub const CONTROL_SOURCES_CSV: &str = "control-sources.csv";
pub const MAPPING_MANIFEST_JSON: &str = "scap-mapping-manifest.json";

/// Files produced by one [`ReportWriter::write`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenArtifacts {
    pub directory: PathBuf,
    /// In write order.
    pub files: Vec<PathBuf>,
}

impl WrittenArtifacts {
    /// Whether an artifact named `name` was written.
    pub fn contains(&self, name: &str) -> bool {
        self.files.iter().any(|f| f.file_name().is_some_and(|n| n == name))
    }
}

/// Writes the consolidated artifact set to a directory.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    directory: PathBuf,
    pretty_json: bool,
    precedence: ToolPrecedence,
}

impl ReportWriter {
    /// Writer targeting `directory` with pretty JSON and the built-in precedence.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            pretty_json: true,
            precedence: ToolPrecedence::new(),
        }
    }

    /// Writer configured from the output section.
    pub fn from_config(config: &OutputConfig) -> Self {
        Self::new(&config.directory).with_pretty_json(config.pretty_json)
    }

    /// Toggle pretty-printed JSON artifacts.
    pub fn with_pretty_json(mut self, pretty: bool) -> Self {
        self.pretty_json = pretty;
        self
    }

    /// Precedence used to order the per-tool coverage rows.
    pub fn with_precedence(mut self, precedence: ToolPrecedence) -> Self {
        self.precedence = precedence;
        self
    }

    /// Change the target directory.
    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = directory.into();
        self
    }

    /// Target directory.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Render and write every artifact. The manifest file is written only
    /// when a manifest is given.
    pub fn write(
        &self,
        report: &ConsolidatedVerifyReport,
        manifest: Option<&ScapMappingManifest>,
    ) -> Result<WrittenArtifacts> {
        self.prepare_directory()?;

        let json = JsonReporter::new().with_pretty(self.pretty_json);
        let coverage = CoverageReport::from_report(report, &self.precedence);
        let coverage_reporter = CoverageReporter::new().with_pretty(self.pretty_json);

        let mut artifacts = vec![
            (CONSOLIDATED_JSON, json.report(report)),
            (CONSOLIDATED_CSV, CsvReporter::new().report(report)),
            (TOOL_COVERAGE_JSON, coverage_reporter.tool_coverage_json(&coverage)),
            (TOOL_COVERAGE_CSV, coverage_reporter.tool_coverage_csv(&coverage)),
            (COVERAGE_OVERLAP_JSON, coverage_reporter.overlap_json(&coverage)),
            (COVERAGE_OVERLAP_CSV, coverage_reporter.overlap_csv(&coverage)),
            (CONTROL_SOURCES_CSV, coverage_reporter.control_sources_csv(&coverage)),
        ];
        if let Some(manifest) = manifest {
            artifacts.push((MAPPING_MANIFEST_JSON, manifest.to_json(self.pretty_json)?));
        }

        let mut files = Vec::with_capacity(artifacts.len());
        for (name, content) in artifacts {
            let path = self.directory.join(name);
            fs::write(&path, content).map_err(|e| ConsolidateError::write_error(&path, e))?;
            debug!(path = %path.display(), "Artifact written");
            files.push(path);
        }

        info!(
            directory = %self.directory.display(),
            files = files.len(),
            results = report.results.len(),
            "Consolidated artifacts written"
        );
        Ok(WrittenArtifacts {
            directory: self.directory.clone(),
            files,
        })
    }

    fn prepare_directory(&self) -> Result<()> {
        if self.directory.exists() {
            if !self.directory.is_dir() {
                return Err(ConsolidateError::NotADirectory(self.directory.clone()));
            }
            return Ok(());
        }
        fs::create_dir_all(&self.directory)
            .map_err(|e| ConsolidateError::create_error(&self.directory, e))
    }
}
