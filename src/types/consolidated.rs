//! Consolidated (merged) verification output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::severity::Severity;
use super::status::VerifyStatus;
use super::verify::{Metadata, NormalizedVerifyResult};

/// Metadata key written by manifest application.
pub const MAPPING_STATUS_KEY: &str = "mapping_status";

/// Provenance of one surviving contributor to a merged control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSource {
    pub tool: String,
    pub source_file: String,
    pub status: VerifyStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benchmark_id: Option<String>,
}

impl From<&NormalizedVerifyResult> for ResultSource {
    fn from(result: &NormalizedVerifyResult) -> Self {
        Self {
            tool: result.tool.clone(),
            source_file: result.source_file.clone(),
            status: result.status,
            verified_at: result.verified_at,
            benchmark_id: result.benchmark_id.clone(),
        }
    }
}

/// One control after reconciliation across tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedVerifyResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vuln_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<String>,
    /// Filled only by manifest application.
    pub benchmark_id: Option<String>,
    pub severity: Severity,
    pub status: VerifyStatus,
    /// The winning tool.
    pub tool: String,
    pub source_file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidence_paths: Vec<String>,
    #[serde(default)]
    pub metadata: Metadata,
    /// Surviving contributors in precedence order; the first is the winner.
    pub sources: Vec<ResultSource>,
}

impl ConsolidatedVerifyResult {
    /// Identifier used for ordering and conflict records.
    pub fn control_key(&self) -> &str {
        self.vuln_id
            .as_deref()
            .or(self.rule_id.as_deref())
            .unwrap_or(&self.title)
    }

    /// Distinct tool labels that contributed to this control.
    pub fn contributing_tools(&self) -> Vec<&str> {
        let mut tools: Vec<&str> = Vec::new();
        for source in &self.sources {
            if !tools.iter().any(|t| t.eq_ignore_ascii_case(&source.tool)) {
                tools.push(&source.tool);
            }
        }
        tools
    }

    /// Value of the `mapping_status` metadata entry, once a manifest was applied.
    pub fn mapping_status(&self) -> Option<&str> {
        self.metadata.get(MAPPING_STATUS_KEY).map(String::as_str)
    }
}

/// Disagreement between tools on one control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictRecord {
    pub control_id: String,
    pub conflicting_results: Vec<NormalizedVerifyResult>,
    pub resolved_status: VerifyStatus,
    pub resolution_reason: String,
}

/// Per-input summary kept in the consolidated report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceReportSummary {
    pub tool: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_version: Option<String>,
    pub result_count: usize,
    pub path: String,
}

/// Counts of merged results by status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSummary {
    pub pass: usize,
    pub fail: usize,
    pub not_applicable: usize,
    pub not_reviewed: usize,
    pub unknown: usize,
    pub total: usize,
}

impl StatusSummary {
    /// Count a sequence of statuses.
    pub fn from_statuses(statuses: impl IntoIterator<Item = VerifyStatus>) -> Self {
        statuses.into_iter().fold(Self::default(), |mut summary, status| {
            summary.record(status);
            summary
        })
    }

    /// Count one more result with `status`.
    pub fn record(&mut self, status: VerifyStatus) {
        match status {
            VerifyStatus::Pass => self.pass += 1,
            VerifyStatus::Fail => self.fail += 1,
            VerifyStatus::NotApplicable => self.not_applicable += 1,
            VerifyStatus::NotReviewed => self.not_reviewed += 1,
            VerifyStatus::Unknown => self.unknown += 1,
        }
        self.total += 1;
    }

    /// Number of results with `status`.
    pub fn count(&self, status: VerifyStatus) -> usize {
        match status {
            VerifyStatus::Pass => self.pass,
            VerifyStatus::Fail => self.fail,
            VerifyStatus::NotApplicable => self.not_applicable,
            VerifyStatus::NotReviewed => self.not_reviewed,
            VerifyStatus::Unknown => self.unknown,
        }
    }
}

/// Final output of the merge orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedVerifyReport {
    pub merged_at: DateTime<Utc>,
    pub source_reports: Vec<SourceReportSummary>,
    pub results: Vec<ConsolidatedVerifyResult>,
    pub conflicts: Vec<ConflictRecord>,
    pub summary: StatusSummary,
    pub diagnostic_messages: Vec<String>,
}

impl ConsolidatedVerifyReport {
    /// Report with no sources and no results.
    pub fn empty(merged_at: DateTime<Utc>) -> Self {
        Self {
            merged_at,
            source_reports: Vec::new(),
            results: Vec::new(),
            conflicts: Vec::new(),
            summary: StatusSummary::default(),
            diagnostic_messages: Vec::new(),
        }
    }

    /// Whether any control had disagreeing tools.
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    /// Conflict recorded for a control id, if any.
    pub fn conflict_for(&self, control_id: &str) -> Option<&ConflictRecord> {
        self.conflicts
            .iter()
            .find(|c| c.control_id.eq_ignore_ascii_case(control_id))
    }
}
