//! Normalized per-tool verification results.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::severity::Severity;
use super::status::VerifyStatus;

/// Insertion-ordered string map attached to every result.
pub type Metadata = IndexMap<String, String>;

/// One finding as reported by a single tool, after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedVerifyResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vuln_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benchmark_id: Option<String>,
    pub severity: Severity,
    pub status: VerifyStatus,
    pub tool: String,
    pub source_file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidence_paths: Vec<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub metadata: Metadata,
}

impl NormalizedVerifyResult {
    /// Create a result with the mandatory fields; everything else starts empty.
    pub fn new(
        tool: impl Into<String>,
        source_file: impl Into<String>,
        title: impl Into<String>,
        status: VerifyStatus,
    ) -> Self {
        Self {
            vuln_id: None,
            rule_id: None,
            title: title.into(),
            asset_id: None,
            benchmark_id: None,
            severity: Severity::Unknown,
            status,
            tool: tool.into(),
            source_file: source_file.into(),
            verified_at: None,
            comments: None,
            evidence_paths: Vec::new(),
            metadata: Metadata::new(),
        }
    }

    /// Set the vulnerability id (`V-…`).
    pub fn with_vuln_id(mut self, vuln_id: impl Into<String>) -> Self {
        self.vuln_id = non_blank(vuln_id.into());
        self
    }

    /// Set the rule id (`SV-…_rule`).
    pub fn with_rule_id(mut self, rule_id: impl Into<String>) -> Self {
        self.rule_id = non_blank(rule_id.into());
        self
    }

    /// Set the asset (host) the finding belongs to.
    pub fn with_asset_id(mut self, asset_id: impl Into<String>) -> Self {
        self.asset_id = non_blank(asset_id.into());
        self
    }

    /// Set the benchmark the tool reported against.
    pub fn with_benchmark_id(mut self, benchmark_id: impl Into<String>) -> Self {
        self.benchmark_id = non_blank(benchmark_id.into());
        self
    }

    /// Set the severity.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Set when the tool verified the control.
    pub fn with_verified_at(mut self, verified_at: Option<DateTime<Utc>>) -> Self {
        self.verified_at = verified_at;
        self
    }

    /// Set reviewer or tool comments.
    pub fn with_comments(mut self, comments: impl Into<String>) -> Self {
        self.comments = non_blank(comments.into());
        self
    }

    /// Append an evidence path unless an equal path (ignoring case) is
    /// already present.
    pub fn with_evidence_path(mut self, path: impl Into<String>) -> Self {
        push_evidence_path(&mut self.evidence_paths, path.into());
        self
    }

    /// Insert a metadata entry, keeping insertion order.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Identifier used for ordering and display: vuln id, then rule id,
    /// then title.
    pub fn control_key(&self) -> &str {
        self.vuln_id
            .as_deref()
            .or(self.rule_id.as_deref())
            .unwrap_or(&self.title)
    }
}

/// The output of one adapter invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedVerifyReport {
    pub tool: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    pub output_root: String,
    pub results: Vec<NormalizedVerifyResult>,
    #[serde(default)]
    pub diagnostic_messages: Vec<String>,
}

impl NormalizedVerifyReport {
    /// Create an empty report for `tool` read from `output_root`.
    pub fn new(tool: impl Into<String>, output_root: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            tool_version: None,
            started_at: None,
            finished_at: None,
            output_root: output_root.into(),
            results: Vec::new(),
            diagnostic_messages: Vec::new(),
        }
    }

    /// Replace the results.
    pub fn with_results(mut self, results: Vec<NormalizedVerifyResult>) -> Self {
        self.results = results;
        self
    }

    /// Record a recoverable parse problem.
    pub fn push_diagnostic(&mut self, message: impl Into<String>) {
        self.diagnostic_messages.push(message.into());
    }

    /// Whether the report carries no results.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Case-insensitive, order-preserving evidence path insertion.
pub(crate) fn push_evidence_path(paths: &mut Vec<String>, path: String) {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return;
    }
    let lower = trimmed.to_lowercase();
    if !paths.iter().any(|p| p.to_lowercase() == lower) {
        paths.push(trimmed.to_string());
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
