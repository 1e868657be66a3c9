//! Adapter trait for the normalization layer.

use crate::error::Result;
use crate::input::ReportSource;
use crate::types::NormalizedVerifyReport;
use std::path::Path;

/// Trait for format adapters.
///
/// Each adapter understands one tool's raw report format and produces a
/// [`NormalizedVerifyReport`]. Data-quality problems never fail a parse;
/// they are recorded in `diagnostic_messages`.
pub trait VerifyAdapter: Send + Sync {
    /// Name of this adapter.
    fn name(&self) -> &str;

    /// Tool label stamped on results when the report does not say otherwise.
    fn tool_label(&self) -> &str;

    /// Check if this adapter understands the given report.
    fn can_parse(&self, path: &str, content: &str) -> bool;

    /// Normalize already-read report content.
    fn parse_content(&self, content: &str, path: &str) -> NormalizedVerifyReport;

    /// Read a report through `source` and normalize it.
    ///
    /// Only a failure to read the report is an error.
    fn parse_results(&self, path: &Path, source: &dyn ReportSource) -> Result<NormalizedVerifyReport> {
        let content = source.read_to_string(path)?;
        Ok(self.parse_content(&content, &path.display().to_string()))
    }
}

/// Shared tail of every adapter: fall back to the report end time for
/// findings without their own timestamp, and flag empty reports.
pub(crate) fn finish_report(report: &mut NormalizedVerifyReport) {
    if let Some(finished_at) = report.finished_at {
        for result in report.results.iter_mut().filter(|r| r.verified_at.is_none()) {
            result.verified_at = Some(finished_at);
        }
    }
    if report.results.is_empty() {
        let message = format!("No results found in {}", report.output_root);
        report.push_diagnostic(message);
    }
}
