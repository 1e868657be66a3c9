//! Merge orchestrator: one reconciliation routine, two projections.

use std::cmp::Ordering;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::grouping::{canonical_order, group_findings};
use super::summary::SummaryBuilder;
use crate::adapter::AdapterRegistry;
use crate::config::MergeConfig;
use crate::input::ReportSource;
use crate::types::verify::push_evidence_path;
use crate::types::{
    ConflictRecord, ConsolidatedVerifyReport, ConsolidatedVerifyResult, Metadata,
    NormalizedVerifyReport, NormalizedVerifyResult, ResultSource, SourceReportSummary,
    ToolPrecedence,
};

/// Reconciles normalized reports into one consolidated report.
#[derive(Debug, Clone, Default)]
pub struct MergeOrchestrator {
    precedence: ToolPrecedence,
    merged_at: Option<DateTime<Utc>>,
}

/// One reconciled control before final ordering.
struct Reconciled {
    result: ConsolidatedVerifyResult,
    conflict: Option<ConflictRecord>,
}

impl MergeOrchestrator {
    /// Create an orchestrator with the built-in precedence table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Orchestrator using the configured tier overrides.
    pub fn from_config(config: &MergeConfig) -> Self {
        Self::new().with_precedence(config.precedence())
    }

    /// Replace the tool precedence table.
    pub fn with_precedence(mut self, precedence: ToolPrecedence) -> Self {
        self.precedence = precedence;
        self
    }

    /// Pin the `merged_at` stamp instead of using the current time.
    pub fn with_merged_at(mut self, merged_at: DateTime<Utc>) -> Self {
        self.merged_at = Some(merged_at);
        self
    }

    /// Tool precedence table in use.
    pub fn precedence(&self) -> &ToolPrecedence {
        &self.precedence
    }

    /// Full consolidated report, including conflicts.
    pub fn merge(&self, reports: &[NormalizedVerifyReport]) -> ConsolidatedVerifyReport {
        self.reconcile(reports)
    }

    /// Winners only.
    pub fn merge_results(&self, reports: &[NormalizedVerifyReport]) -> Vec<ConsolidatedVerifyResult> {
        self.reconcile(reports).results
    }

    /// Read, adapt and merge report files.
    ///
    /// Unreadable files and files no adapter recognizes are recorded as
    /// diagnostics and excluded; the remaining files are still merged.
    pub fn consolidate_files(
        &self,
        paths: &[PathBuf],
        source: &dyn ReportSource,
        registry: &AdapterRegistry,
    ) -> ConsolidatedVerifyReport {
        let mut diagnostics = Vec::new();
        let mut reports = Vec::new();

        for path in paths {
            let shown = path.display().to_string();
            let content = match source.read_to_string(path) {
                Ok(content) => content,
                Err(e) => {
                    warn!(path = %shown, error = %e, "Skipping unreadable report");
                    diagnostics.push(format!("Could not read {shown}: {e}"));
                    continue;
                }
            };
            match registry.find_adapter(&shown, &content) {
                Some(adapter) => {
                    debug!(path = %shown, adapter = adapter.name(), "Adapter selected");
                    reports.push(adapter.parse_content(&content, &shown));
                }
                None => {
                    warn!(path = %shown, "No adapter recognizes report");
                    diagnostics.push(format!("No adapter recognizes {shown}; skipped"));
                }
            }
        }

        let mut report = self.reconcile(&reports);
        diagnostics.sort();
        diagnostics.append(&mut report.diagnostic_messages);
        report.diagnostic_messages = diagnostics;
        report
    }

    fn reconcile(&self, reports: &[NormalizedVerifyReport]) -> ConsolidatedVerifyReport {
        let merged_at = self.merged_at.unwrap_or_else(Utc::now);

        let mut ordered: Vec<&NormalizedVerifyReport> = reports.iter().collect();
        ordered.sort_by(|a, b| {
            a.output_root
                .cmp(&b.output_root)
                .then_with(|| a.tool.cmp(&b.tool))
                .then_with(|| a.tool_version.cmp(&b.tool_version))
                .then_with(|| a.results.len().cmp(&b.results.len()))
                .then_with(|| a.diagnostic_messages.cmp(&b.diagnostic_messages))
        });

        let source_reports: Vec<SourceReportSummary> = ordered
            .iter()
            .map(|r| SourceReportSummary {
                tool: r.tool.clone(),
                tool_version: r.tool_version.clone(),
                result_count: r.results.len(),
                path: r.output_root.clone(),
            })
            .collect();
        let mut diagnostics: Vec<String> = ordered
            .iter()
            .flat_map(|r| r.diagnostic_messages.iter().cloned())
            .collect();

        let mut findings: Vec<&NormalizedVerifyResult> =
            ordered.iter().flat_map(|r| r.results.iter()).collect();
        findings.sort_by(|a, b| canonical_order(a, b));

        let grouping = group_findings(&findings);
        diagnostics.extend(grouping.diagnostics);

        let mut reconciled: Vec<Reconciled> = grouping
            .groups
            .iter()
            .map(|members| {
                let group: Vec<&NormalizedVerifyResult> =
                    members.iter().map(|&i| findings[i]).collect();
                self.reconcile_group(&group)
            })
            .collect();
        reconciled.sort_by(|a, b| result_order(&a.result, &b.result));

        let (results, conflicts): (Vec<_>, Vec<_>) = reconciled
            .into_iter()
            .map(|r| (r.result, r.conflict))
            .unzip();
        let conflicts: Vec<ConflictRecord> = conflicts.into_iter().flatten().collect();
        let summary = SummaryBuilder::new().with_results(&results).build();

        info!(
            reports = source_reports.len(),
            findings = findings.len(),
            controls = results.len(),
            conflicts = conflicts.len(),
            "Merge finished"
        );

        ConsolidatedVerifyReport {
            merged_at,
            source_reports,
            results,
            conflicts,
            summary,
            diagnostic_messages: diagnostics,
        }
    }

    fn reconcile_group(&self, group: &[&NormalizedVerifyResult]) -> Reconciled {
        let contributors = self.rank(dedup_by_tool(group));
        let result = self.coalesce(&contributors);

        let conflict = has_disagreement(&contributors).then(|| ConflictRecord {
            control_id: result.control_key().to_string(),
            conflicting_results: contributors.iter().map(|r| (*r).clone()).collect(),
            resolved_status: result.status,
            resolution_reason: self.resolution_reason(&contributors),
        });

        Reconciled { result, conflict }
    }

    /// Precedence order, highest first.
    fn rank<'a>(&self, mut contributors: Vec<&'a NormalizedVerifyResult>) -> Vec<&'a NormalizedVerifyResult> {
        contributors.sort_by(|a, b| {
            self.precedence
                .compare(&a.tool, &b.tool)
                .then_with(|| canonical_order(a, b))
        });
        contributors
    }

    fn resolution_reason(&self, contributors: &[&NormalizedVerifyResult]) -> String {
        let winner = contributors[0];
        let tier = self.precedence.tier_of(&winner.tool);
        let others: Vec<&str> = contributors[1..].iter().map(|r| r.tool.as_str()).collect();
        format!(
            "Resolved by {} ({}) over {}",
            winner.tool,
            tier.description(),
            others.join(", ")
        )
    }

    fn coalesce(&self, contributors: &[&NormalizedVerifyResult]) -> ConsolidatedVerifyResult {
        let winner = contributors[0];

        let title = contributors
            .iter()
            .map(|r| r.title.trim())
            .find(|t| !t.is_empty())
            .unwrap_or_default()
            .to_string();
        let severity = contributors
            .iter()
            .map(|r| r.severity)
            .find(|s| s.is_known())
            .unwrap_or_default();

        let mut comments: Vec<&str> = Vec::new();
        for comment in contributors.iter().filter_map(|r| r.comments.as_deref()) {
            let comment = comment.trim();
            if !comment.is_empty() && comments.last() != Some(&comment) {
                comments.push(comment);
            }
        }

        let mut evidence_paths = Vec::new();
        for path in contributors.iter().flat_map(|r| r.evidence_paths.iter()) {
            push_evidence_path(&mut evidence_paths, path.clone());
        }

        let mut metadata: Metadata = winner.metadata.clone();
        for other in &contributors[1..] {
            let prefix = other.tool.to_lowercase();
            for (key, value) in &other.metadata {
                metadata
                    .entry(format!("{prefix}_{key}"))
                    .or_insert_with(|| value.clone());
            }
        }

        ConsolidatedVerifyResult {
            vuln_id: contributors.iter().find_map(|r| r.vuln_id.clone()),
            rule_id: contributors.iter().find_map(|r| r.rule_id.clone()),
            title,
            asset_id: contributors.iter().find_map(|r| r.asset_id.clone()),
            benchmark_id: None,
            severity,
            status: winner.status,
            tool: winner.tool.clone(),
            source_file: winner.source_file.clone(),
            verified_at: winner.verified_at,
            comments: (!comments.is_empty()).then(|| comments.join("\n")),
            evidence_paths,
            metadata,
            sources: contributors.iter().map(|r| ResultSource::from(*r)).collect(),
        }
    }
}

/// Keep one finding per tool: latest `verified_at` (missing is oldest),
/// ties broken by ascending source file.
fn dedup_by_tool<'a>(group: &[&'a NormalizedVerifyResult]) -> Vec<&'a NormalizedVerifyResult> {
    let mut kept: Vec<&NormalizedVerifyResult> = Vec::new();
    for &candidate in group {
        match kept.iter_mut().find(|k| k.tool.eq_ignore_ascii_case(&candidate.tool)) {
            Some(existing) => {
                if supersedes(candidate, existing) {
                    *existing = candidate;
                }
            }
            None => kept.push(candidate),
        }
    }
    kept
}

fn supersedes(candidate: &NormalizedVerifyResult, existing: &NormalizedVerifyResult) -> bool {
    match candidate.verified_at.cmp(&existing.verified_at) {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => match candidate.source_file.cmp(&existing.source_file) {
            Ordering::Less => true,
            Ordering::Greater => false,
            Ordering::Equal => canonical_order(candidate, existing) == Ordering::Less,
        },
    }
}

fn has_disagreement(contributors: &[&NormalizedVerifyResult]) -> bool {
    contributors
        .iter()
        .any(|r| r.status != contributors[0].status)
}

fn lower(value: Option<&str>) -> String {
    value.unwrap_or_default().to_lowercase()
}

/// Case-insensitive stable identifier, then asset, then the other
/// identity fields.
fn result_order(a: &ConsolidatedVerifyResult, b: &ConsolidatedVerifyResult) -> Ordering {
    a.control_key()
        .to_lowercase()
        .cmp(&b.control_key().to_lowercase())
        .then_with(|| lower(a.asset_id.as_deref()).cmp(&lower(b.asset_id.as_deref())))
        .then_with(|| lower(a.vuln_id.as_deref()).cmp(&lower(b.vuln_id.as_deref())))
        .then_with(|| lower(a.rule_id.as_deref()).cmp(&lower(b.rule_id.as_deref())))
        .then_with(|| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
        .then_with(|| a.tool.cmp(&b.tool))
        .then_with(|| a.source_file.cmp(&b.source_file))
        .then_with(|| a.status.cmp(&b.status))
}
