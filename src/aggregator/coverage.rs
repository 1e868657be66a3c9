//! Per-tool coverage, coverage overlap and the control→source map.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::summary::{SeverityBreakdown, SummaryBuilder};
use crate::types::{
    ConsolidatedVerifyReport, StatusSummary, ToolPrecedence, ToolTier, VerifyStatus,
};

/// What one tool contributed to a consolidated report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCoverage {
    pub tool: String,
    pub tier: ToolTier,
    /// Input reports produced by this tool.
    pub reports: usize,
    /// Raw findings across those reports, before de-duplication.
    pub findings: usize,
    /// Controls this tool contributed a surviving finding to.
    pub controls_contributed: usize,
    /// Controls whose status this tool decided.
    pub controls_won: usize,
    /// This tool's own statuses across the controls it contributed to.
    pub statuses: StatusSummary,
}

impl ToolCoverage {
    fn new(tool: &str, tier: ToolTier) -> Self {
        Self {
            tool: tool.to_string(),
            tier,
            reports: 0,
            findings: 0,
            controls_contributed: 0,
            controls_won: 0,
            statuses: StatusSummary::default(),
        }
    }
}

/// Controls confirmed by exactly `tool_count` distinct tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlapRow {
    pub tool_count: usize,
    pub control_count: usize,
}

/// One contributor row of the control→source map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlSource {
    pub vuln_id: Option<String>,
    pub rule_id: Option<String>,
    pub title: String,
    pub tool: String,
    pub source_file: String,
    pub status: VerifyStatus,
    pub verified_at: Option<DateTime<Utc>>,
    pub is_winner: bool,
}

/// Coverage views derived from a consolidated report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageReport {
    pub tools: Vec<ToolCoverage>,
    pub overlap: Vec<OverlapRow>,
    pub open_by_severity: SeverityBreakdown,
    #[serde(skip)]
    pub control_sources: Vec<ControlSource>,
}

impl CoverageReport {
    /// Derive all coverage views from a consolidated report.
    pub fn from_report(report: &ConsolidatedVerifyReport, precedence: &ToolPrecedence) -> Self {
        let mut tools: IndexMap<String, ToolCoverage> = IndexMap::new();

        for source in &report.source_reports {
            let coverage = coverage_for(&mut tools, &source.tool, precedence);
            coverage.reports += 1;
            coverage.findings += source.result_count;
        }

        let mut overlap: Vec<usize> = Vec::new();
        let mut control_sources = Vec::new();
        for result in &report.results {
            for (position, source) in result.sources.iter().enumerate() {
                let coverage = coverage_for(&mut tools, &source.tool, precedence);
                coverage.controls_contributed += 1;
                coverage.statuses.record(source.status);
                if position == 0 {
                    coverage.controls_won += 1;
                }
                control_sources.push(ControlSource {
                    vuln_id: result.vuln_id.clone(),
                    rule_id: result.rule_id.clone(),
                    title: result.title.clone(),
                    tool: source.tool.clone(),
                    source_file: source.source_file.clone(),
                    status: source.status,
                    verified_at: source.verified_at,
                    is_winner: position == 0,
                });
            }

            let count = result.contributing_tools().len();
            if count > 0 {
                if overlap.len() < count {
                    overlap.resize(count, 0);
                }
                overlap[count - 1] += 1;
            }
        }

        let mut tools: Vec<ToolCoverage> = tools.into_values().collect();
        tools.sort_by(|a, b| precedence.compare(&a.tool, &b.tool));

        Self {
            tools,
            overlap: overlap
                .into_iter()
                .enumerate()
                .map(|(i, control_count)| OverlapRow {
                    tool_count: i + 1,
                    control_count,
                })
                .collect(),
            open_by_severity: SummaryBuilder::new()
                .with_results(&report.results)
                .open_by_severity(),
            control_sources,
        }
    }

    /// Coverage row for a tool label, case-insensitively.
    pub fn tool(&self, label: &str) -> Option<&ToolCoverage> {
        self.tools.iter().find(|t| t.tool.eq_ignore_ascii_case(label))
    }
}

fn coverage_for<'m>(
    tools: &'m mut IndexMap<String, ToolCoverage>,
    tool: &str,
    precedence: &ToolPrecedence,
) -> &'m mut ToolCoverage {
    tools
        .entry(tool.to_lowercase())
        .or_insert_with(|| ToolCoverage::new(tool, precedence.tier_of(tool)))
}
