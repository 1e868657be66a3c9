//! Evaluate-STIG result XML adapter.

use super::timestamp::parse_timestamp;
use super::traits::{VerifyAdapter, finish_report};
use super::xml::{self, XmlElement, XmlEvent};
use crate::types::status::normalize_token;
use crate::types::verify::push_evidence_path;
use crate::types::{
    EVALUATE_STIG_TOOL, NormalizedVerifyReport, NormalizedVerifyResult, Severity, VerifyStatus,
};
use tracing::debug;

/// Adapter for Evaluate-STIG `Finding`/`Check` result documents.
pub struct EvaluateStigAdapter;

impl EvaluateStigAdapter {
    /// Adapter with the default severity policy.
    pub fn new() -> Self {
        Self
    }
}

impl Default for EvaluateStigAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn is_evaluate_root(name: &str) -> bool {
    normalize_token(name).contains("evaluatestig")
}

#[derive(Debug, Default)]
struct FindingEntry {
    vuln_id: Option<String>,
    rule_id: Option<String>,
    title: Option<String>,
    severity: Option<String>,
    status: Option<String>,
    timestamp: Option<String>,
    benchmark_id: Option<String>,
    comments: Vec<String>,
    evidence: Vec<String>,
    finding_details: Option<String>,
}

impl FindingEntry {
    fn from_element(element: &XmlElement) -> Self {
        let owned = |keys: &[&str]| element.attr(keys).map(str::to_string);
        Self {
            vuln_id: owned(&["vulnid", "vulnnum", "groupid"]),
            rule_id: owned(&["ruleid"]),
            title: owned(&["ruletitle", "title"]),
            severity: owned(&["severity"]),
            status: owned(&["status", "result"]),
            timestamp: owned(&["timestamp", "time"]),
            benchmark_id: owned(&["benchmarkid", "stig", "stigid"]),
            ..Self::default()
        }
    }

    /// Child element text; attributes already present win.
    fn absorb_child(&mut self, name: &str, text: String) {
        if text.is_empty() {
            return;
        }
        fn fill(slot: &mut Option<String>, text: String) {
            if slot.is_none() {
                *slot = Some(text);
            }
        }
        match normalize_token(name).as_str() {
            "comments" | "comment" => self.comments.push(text),
            "evidence" | "evidencepath" => self.evidence.push(text),
            "findingdetails" | "details" => fill(&mut self.finding_details, text),
            "vulnid" | "vulnnum" => fill(&mut self.vuln_id, text),
            "ruleid" => fill(&mut self.rule_id, text),
            "ruletitle" | "title" => fill(&mut self.title, text),
            "severity" => fill(&mut self.severity, text),
            "status" | "result" => fill(&mut self.status, text),
            "timestamp" | "time" => fill(&mut self.timestamp, text),
            _ => {}
        }
    }
}

#[derive(Debug, Default)]
struct EvaluateState {
    root: Option<String>,
    tool_version: Option<String>,
    started_at: Option<String>,
    finished_at: Option<String>,
    computer_name: Option<String>,
    stig_benchmark: Option<String>,
    finding: Option<FindingEntry>,
    finding_index: usize,
    entries: Vec<FindingEntry>,
    diagnostics: Vec<String>,
}

impl EvaluateState {
    fn on_event(&mut self, event: XmlEvent, path: &str) {
        match event {
            XmlEvent::Open(element) => {
                if self.root.is_none() {
                    self.root = Some(element.name.clone());
                    self.tool_version = element.attr(&["version"]).map(str::to_string);
                    self.started_at = element.attr(&["starttime"]).map(str::to_string);
                    self.finished_at = element.attr(&["endtime"]).map(str::to_string);
                    self.computer_name = element
                        .attr(&["computername", "hostname"])
                        .map(str::to_string);
                    return;
                }
                match element.name.as_str() {
                    "stig" if self.finding.is_none() => {
                        self.stig_benchmark = element
                            .attr(&["benchmarkid", "stigid", "id"])
                            .map(str::to_string);
                    }
                    "finding" | "check" => {
                        self.finding = Some(FindingEntry::from_element(&element));
                    }
                    _ => {}
                }
            }
            XmlEvent::Close { name, text } => match name.as_str() {
                "finding" | "check" => {
                    self.finding_index += 1;
                    if let Some(mut entry) = self.finding.take() {
                        if entry.benchmark_id.is_none() {
                            entry.benchmark_id = self.stig_benchmark.clone();
                        }
                        if entry.vuln_id.is_none() && entry.rule_id.is_none() && entry.title.is_none()
                        {
                            self.diagnostics.push(format!(
                                "Skipped finding #{} in {}: no VulnID, RuleID or RuleTitle",
                                self.finding_index, path
                            ));
                        } else {
                            self.entries.push(entry);
                        }
                    }
                }
                "stig" if self.finding.is_none() => self.stig_benchmark = None,
                _ => {
                    if let Some(entry) = self.finding.as_mut() {
                        entry.absorb_child(&name, text);
                    }
                }
            },
        }
    }

    fn build_result(&mut self, entry: FindingEntry, path: &str) -> NormalizedVerifyResult {
        let key = entry
            .vuln_id
            .clone()
            .or_else(|| entry.rule_id.clone())
            .or_else(|| entry.title.clone())
            .unwrap_or_default();

        let status = match entry.status.as_deref() {
            Some(raw) => {
                let status = VerifyStatus::from_token(raw);
                if status == VerifyStatus::Unknown && !raw.eq_ignore_ascii_case("unknown") {
                    self.diagnostics
                        .push(format!("{key} in {path} has unrecognized status '{raw}'"));
                }
                status
            }
            None => {
                self.diagnostics
                    .push(format!("{key} in {path} has no Status; recorded as Unknown"));
                VerifyStatus::Unknown
            }
        };

        let verified_at = entry.timestamp.as_deref().and_then(|raw| {
            let parsed = parse_timestamp(raw);
            if parsed.is_none() {
                self.diagnostics
                    .push(format!("{key} in {path} has unparseable timestamp '{raw}'"));
            }
            parsed
        });

        let title = entry.title.clone().unwrap_or_else(|| key.clone());
        let mut result = NormalizedVerifyResult::new(EVALUATE_STIG_TOOL, path, title, status)
            .with_severity(
                entry
                    .severity
                    .as_deref()
                    .map(Severity::from_token)
                    .unwrap_or_default(),
            )
            .with_verified_at(verified_at)
            .with_comments(entry.comments.join("\n"));
        if let Some(vuln_id) = entry.vuln_id {
            result = result.with_vuln_id(vuln_id);
        }
        if let Some(rule_id) = entry.rule_id {
            result = result.with_rule_id(rule_id);
        }
        if let Some(benchmark_id) = entry.benchmark_id {
            result = result.with_benchmark_id(benchmark_id);
        }
        if let Some(host) = &self.computer_name {
            result = result.with_asset_id(host.clone());
        }
        for evidence in entry.evidence {
            push_evidence_path(&mut result.evidence_paths, evidence);
        }
        if let Some(details) = entry.finding_details {
            result = result.with_metadata("finding_details", details);
        }
        result
    }
}

impl VerifyAdapter for EvaluateStigAdapter {
    fn name(&self) -> &str {
        "evaluate-stig"
    }

    fn tool_label(&self) -> &str {
        EVALUATE_STIG_TOOL
    }

    fn can_parse(&self, _path: &str, content: &str) -> bool {
        xml::root_element(content).is_some_and(|root| is_evaluate_root(&root))
    }

    fn parse_content(&self, content: &str, path: &str) -> NormalizedVerifyReport {
        let mut state = EvaluateState::default();
        let outcome = xml::walk(content, |event| state.on_event(event, path));

        let mut report = NormalizedVerifyReport::new(EVALUATE_STIG_TOOL, path);
        if let Err(e) = outcome {
            report.push_diagnostic(format!(
                "Malformed Evaluate-STIG XML in {path} {e}; kept {} findings parsed before the error",
                state.entries.len()
            ));
        }
        if !state.root.as_deref().is_some_and(is_evaluate_root) {
            report.push_diagnostic(format!("Missing Evaluate-STIG root element in {path}"));
        }

        report.tool_version = state.tool_version.clone();
        report.started_at = state.started_at.as_deref().and_then(parse_timestamp);
        report.finished_at = state.finished_at.as_deref().and_then(parse_timestamp);

        let entries = std::mem::take(&mut state.entries);
        report.results = entries
            .into_iter()
            .map(|entry| state.build_result(entry, path))
            .collect();
        report.diagnostic_messages.append(&mut state.diagnostics);

        debug!(
            path,
            count = report.results.len(),
            version = ?report.tool_version,
            "Parsed Evaluate-STIG results"
        );
        finish_report(&mut report);
        report
    }
}
