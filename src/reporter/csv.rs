//! `consolidated-results.csv` rendering.

use crate::reporter::{Reporter, csv_record, format_timestamp};
use crate::types::{ConsolidatedVerifyReport, ConsolidatedVerifyResult};

pub const CONSOLIDATED_HEADER: [&str; 13] = [
    "VulnId",
    "RuleId",
    "Title",
    "AssetId",
    "BenchmarkId",
    "Severity",
    "Status",
    "Tool",
    "SourceFile",
    "VerifiedAt",
    "Sources",
    "Comments",
    "MappingStatus",
];

/// One row per consolidated result, in report order.
pub struct CsvReporter;

impl CsvReporter {
    /// Create a CSV reporter.
    pub fn new() -> Self {
        Self
    }

    fn row(result: &ConsolidatedVerifyResult) -> String {
        let sources = result
            .sources
            .iter()
            .map(|s| format!("{}={}", s.tool, s.status))
            .collect::<Vec<_>>()
            .join("; ");
        csv_record([
            result.vuln_id.as_deref().unwrap_or_default(),
            result.rule_id.as_deref().unwrap_or_default(),
            result.title.as_str(),
            result.asset_id.as_deref().unwrap_or_default(),
            result.benchmark_id.as_deref().unwrap_or_default(),
            result.severity.as_str(),
            result.status.as_str(),
            result.tool.as_str(),
            result.source_file.as_str(),
            format_timestamp(result.verified_at).as_str(),
            sources.as_str(),
            result.comments.as_deref().unwrap_or_default(),
            result.mapping_status().unwrap_or_default(),
        ])
    }
}

impl Default for CsvReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for CsvReporter {
    fn report(&self, report: &ConsolidatedVerifyReport) -> String {
        let mut out = csv_record(CONSOLIDATED_HEADER);
        for result in &report.results {
            out.push_str(&Self::row(result));
        }
        out
    }
}
