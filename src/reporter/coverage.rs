//! Coverage artifacts: per-tool summary, overlap table and the
//! control→source map.

use serde::Serialize;

use crate::aggregator::{CoverageReport, OverlapRow, SeverityBreakdown, ToolCoverage};
use crate::reporter::json::JsonReporter;
use crate::reporter::{csv_record, format_timestamp};

pub const TOOL_COVERAGE_HEADER: [&str; 11] = [
    "Tool",
    "Tier",
    "Reports",
    "Findings",
    "ControlsContributed",
    "ControlsWon",
    "Pass",
    "Fail",
    "NotApplicable",
    "NotReviewed",
    "Unknown",
];

pub const OVERLAP_HEADER: [&str; 2] = ["ToolCount", "ControlCount"];

pub const CONTROL_SOURCES_HEADER: [&str; 8] = [
    "VulnId",
    "RuleId",
    "Title",
    "Tool",
    "SourceFile",
    "Status",
    "VerifiedAt",
    "IsWinner",
];

#[derive(Serialize)]
struct ToolCoverageDocument<'a> {
    tools: &'a [ToolCoverage],
    open_by_severity: &'a SeverityBreakdown,
}

#[derive(Serialize)]
struct OverlapDocument<'a> {
    overlap: &'a [OverlapRow],
}

/// Renders the views of a [`CoverageReport`].
pub struct CoverageReporter {
    json: JsonReporter,
}

impl CoverageReporter {
    /// Coverage reporter with pretty-printed JSON.
    pub fn new() -> Self {
        Self {
            json: JsonReporter::new(),
        }
    }

    /// Toggle pretty-printed JSON.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.json = self.json.with_pretty(pretty);
        self
    }

    /// Per-tool coverage and open findings by severity as JSON.
    pub fn tool_coverage_json(&self, coverage: &CoverageReport) -> String {
        self.json.render(&ToolCoverageDocument {
            tools: &coverage.tools,
            open_by_severity: &coverage.open_by_severity,
        })
    }

    /// Per-tool coverage as CSV.
    pub fn tool_coverage_csv(&self, coverage: &CoverageReport) -> String {
        let mut out = csv_record(TOOL_COVERAGE_HEADER);
        for tool in &coverage.tools {
            let s = &tool.statuses;
            out.push_str(&csv_record([
                tool.tool.clone(),
                tool.tier.to_string(),
                tool.reports.to_string(),
                tool.findings.to_string(),
                tool.controls_contributed.to_string(),
                tool.controls_won.to_string(),
                s.pass.to_string(),
                s.fail.to_string(),
                s.not_applicable.to_string(),
                s.not_reviewed.to_string(),
                s.unknown.to_string(),
            ]));
        }
        out
    }

    /// Overlap histogram as JSON.
    pub fn overlap_json(&self, coverage: &CoverageReport) -> String {
        self.json.render(&OverlapDocument {
            overlap: &coverage.overlap,
        })
    }

    /// Overlap histogram as CSV.
    pub fn overlap_csv(&self, coverage: &CoverageReport) -> String {
        let mut out = csv_record(OVERLAP_HEADER);
        for row in &coverage.overlap {
            out.push_str(&csv_record([
                row.tool_count.to_string(),
                row.control_count.to_string(),
            ]));
        }
        out
    }

    /// One row per contributing source of every control.
    pub fn control_sources_csv(&self, coverage: &CoverageReport) -> String {
        let mut out = csv_record(CONTROL_SOURCES_HEADER);
        for source in &coverage.control_sources {
            out.push_str(&csv_record([
                source.vuln_id.as_deref().unwrap_or_default(),
                source.rule_id.as_deref().unwrap_or_default(),
                source.title.as_str(),
                source.tool.as_str(),
                source.source_file.as_str(),
                source.status.as_str(),
                format_timestamp(source.verified_at).as_str(),
                if source.is_winner { "true" } else { "false" },
            ]));
        }
        out
    }
}

impl Default for CoverageReporter {
    fn default() -> Self {
        Self::new()
    }
}
