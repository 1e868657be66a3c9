//! Summary builder for consolidated results.

use serde::{Deserialize, Serialize};

use crate::types::{ConsolidatedVerifyResult, Severity, StatusSummary, VerifyStatus};

/// Open (failing) controls by severity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityBreakdown {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub unknown: usize,
}

impl SeverityBreakdown {
    /// Sum over all severities.
    pub fn total(&self) -> usize {
        self.high + self.medium + self.low + self.unknown
    }
}

/// Builder for status and severity summaries.
#[derive(Debug, Default)]
pub struct SummaryBuilder<'a> {
    results: &'a [ConsolidatedVerifyResult],
}

impl<'a> SummaryBuilder<'a> {
    /// Create a new summary builder.
    pub fn new() -> Self {
        Self { results: &[] }
    }

    /// Results to summarize.
    pub fn with_results(mut self, results: &'a [ConsolidatedVerifyResult]) -> Self {
        self.results = results;
        self
    }

    /// Get the number of controls summarized.
    pub fn total_controls(&self) -> usize {
        self.results.len()
    }

    /// Counts of merged results by status.
    pub fn build(&self) -> StatusSummary {
        StatusSummary::from_statuses(self.results.iter().map(|r| r.status))
    }

    /// Failing controls by severity.
    pub fn open_by_severity(&self) -> SeverityBreakdown {
        self.results
            .iter()
            .filter(|r| r.status == VerifyStatus::Fail)
            .fold(SeverityBreakdown::default(), |mut breakdown, r| {
                match r.severity {
                    Severity::High => breakdown.high += 1,
                    Severity::Medium => breakdown.medium += 1,
                    Severity::Low => breakdown.low += 1,
                    Severity::Unknown => breakdown.unknown += 1,
                }
                breakdown
            })
    }
}
