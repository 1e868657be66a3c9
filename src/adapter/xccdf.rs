//! SCAP / XCCDF `TestResult` adapter.
//!
//! Handles stand-alone `TestResult` documents as well as results embedded
//! in a `Benchmark`, an ARF `asset-report-collection` or a source data
//! stream. `Rule` definitions seen anywhere in the document supply titles,
//! severities and V-numbers for the rule results that reference them.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::timestamp::parse_timestamp;
use super::traits::{VerifyAdapter, finish_report};
use super::xml::{self, XmlEvent};
use crate::config::SeverityPolicy;
use crate::types::{
    NormalizedVerifyReport, NormalizedVerifyResult, SCAP_TOOL, SCC_TOOL, Severity, VerifyStatus,
};

const XCCDF_ROOTS: [&str; 4] = [
    "benchmark",
    "testresult",
    "asset-report-collection",
    "data-stream-collection",
];

static VULN_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bV-\d+\b").expect("valid vuln id regex"));

/// Strip the XCCDF 1.2 namespace prefix from a benchmark id, so
/// `xccdf_mil.disa.stig_benchmark_RHEL_8_STIG` becomes `RHEL_8_STIG`.
pub fn short_benchmark_id(id: &str) -> &str {
    id.split_once("_benchmark_").map_or(id, |(_, short)| short)
}

/// Rule id without the XCCDF 1.2 prefix (`..._rule_SV-1r1_rule` → `SV-1r1_rule`).
pub fn short_rule_id(idref: &str) -> &str {
    idref.split_once("_rule_").map_or(idref, |(_, short)| short)
}

fn vuln_in(text: &str) -> Option<String> {
    VULN_ID_RE.find(text).map(|m| m.as_str().to_string())
}

/// Adapter for XCCDF result documents produced by SCC or other SCAP scanners.
pub struct XccdfAdapter {
    severity_policy: SeverityPolicy,
}

impl XccdfAdapter {
    /// Adapter deriving severities from weights with `severity_policy`.
    pub fn new(severity_policy: SeverityPolicy) -> Self {
        Self { severity_policy }
    }
}

impl Default for XccdfAdapter {
    fn default() -> Self {
        Self::new(SeverityPolicy::default())
    }
}

#[derive(Debug, Default, Clone)]
struct RuleDefinition {
    title: Option<String>,
    vuln_id: Option<String>,
    severity: Option<String>,
    weight: Option<String>,
}

#[derive(Debug, Default)]
struct RuleResultEntry {
    idref: String,
    time: Option<String>,
    severity: Option<String>,
    weight: Option<String>,
    result: Option<String>,
    vuln_id: Option<String>,
    messages: Vec<String>,
}

#[derive(Debug, Default)]
struct XccdfState {
    root: Option<String>,
    benchmark_id: Option<String>,
    group_vuln: Option<String>,
    rule: Option<(String, RuleDefinition)>,
    rules: HashMap<String, RuleDefinition>,
    in_test_result: bool,
    test_result_count: usize,
    test_result_benchmark: Option<String>,
    start_time: Option<String>,
    end_time: Option<String>,
    test_system: Option<String>,
    target: Option<String>,
    rule_result: Option<RuleResultEntry>,
    rule_results: Vec<RuleResultEntry>,
}

impl XccdfState {
    fn on_event(&mut self, event: XmlEvent) {
        match event {
            XmlEvent::Open(element) => {
                if self.root.is_none() {
                    self.root = Some(element.name.clone());
                }
                match element.name.as_str() {
                    "benchmark" if self.in_test_result => {
                        self.test_result_benchmark = element
                            .attr(&["id", "href"])
                            .map(|id| short_benchmark_id(id.trim_start_matches('#')).to_string());
                    }
                    "benchmark" => {
                        if self.benchmark_id.is_none() {
                            self.benchmark_id =
                                element.attr(&["id"]).map(|id| short_benchmark_id(id).to_string());
                        }
                    }
                    "group" => {
                        if let Some(vuln) = element.attr(&["id"]).and_then(vuln_in) {
                            self.group_vuln = Some(vuln);
                        }
                    }
                    "rule" => {
                        if let Some(id) = element.attr(&["id"]) {
                            let definition = RuleDefinition {
                                vuln_id: self.group_vuln.clone(),
                                severity: element.attr(&["severity"]).map(str::to_string),
                                weight: element.attr(&["weight"]).map(str::to_string),
                                ..RuleDefinition::default()
                            };
                            self.rule = Some((short_rule_id(id).to_string(), definition));
                        }
                    }
                    "testresult" => {
                        self.in_test_result = true;
                        self.test_result_count += 1;
                        self.start_time = element.attr(&["starttime"]).map(str::to_string);
                        self.end_time = element.attr(&["endtime"]).map(str::to_string);
                        self.test_system = element.attr(&["testsystem"]).map(str::to_string);
                    }
                    "rule-result" if self.in_test_result => {
                        self.rule_result = Some(RuleResultEntry {
                            idref: element.attr(&["idref"]).unwrap_or_default().to_string(),
                            time: element.attr(&["time"]).map(str::to_string),
                            severity: element.attr(&["severity"]).map(str::to_string),
                            weight: element.attr(&["weight"]).map(str::to_string),
                            ..RuleResultEntry::default()
                        });
                    }
                    _ => {}
                }
            }
            XmlEvent::Close { name, text } => self.on_close(&name, text),
        }
    }

    fn on_close(&mut self, name: &str, text: String) {
        if let Some(entry) = self.rule_result.as_mut() {
            match name {
                "result" if !text.is_empty() => entry.result = Some(text),
                "ident" => {
                    if entry.vuln_id.is_none() {
                        entry.vuln_id = vuln_in(&text);
                    }
                }
                "message" if !text.is_empty() => entry.messages.push(text),
                "rule-result" => {
                    if let Some(entry) = self.rule_result.take() {
                        self.rule_results.push(entry);
                    }
                }
                _ => {}
            }
            return;
        }
        if let Some((_, definition)) = self.rule.as_mut() {
            match name {
                "title" if definition.title.is_none() && !text.is_empty() => {
                    definition.title = Some(text)
                }
                "ident" => {
                    if definition.vuln_id.is_none() {
                        definition.vuln_id = vuln_in(&text);
                    }
                }
                "rule" => {
                    if let Some((id, definition)) = self.rule.take() {
                        self.rules.insert(id, definition);
                    }
                }
                _ => {}
            }
            return;
        }
        match name {
            "group" => self.group_vuln = None,
            "target" if self.in_test_result && self.target.is_none() && !text.is_empty() => {
                self.target = Some(text)
            }
            "testresult" => self.in_test_result = false,
            _ => {}
        }
    }
}

impl XccdfAdapter {
    fn severity_of(&self, entry: &RuleResultEntry, definition: Option<&RuleDefinition>) -> Severity {
        let from_label = |label: Option<&String>| {
            label
                .map(|s| Severity::from_token(s))
                .filter(Severity::is_known)
        };
        let from_weight = |weight: Option<&String>| {
            weight
                .and_then(|w| w.trim().parse::<f64>().ok())
                .map(|w| Severity::from_weight(w, &self.severity_policy))
        };
        from_label(entry.severity.as_ref())
            .or_else(|| from_weight(entry.weight.as_ref()))
            .or_else(|| from_label(definition.and_then(|d| d.severity.as_ref())))
            .or_else(|| from_weight(definition.and_then(|d| d.weight.as_ref())))
            .unwrap_or_default()
    }
}

/// `SCC` when the test system names SCC, else `SCAP`.
fn tool_label_for(test_system: Option<&str>) -> &'static str {
    match test_system {
        Some(system) if system.to_lowercase().contains("scc") => SCC_TOOL,
        _ => SCAP_TOOL,
    }
}

/// Last CPE segment of the test system (`cpe:/a:spawar:scc:5.10` → `5.10`).
fn tool_version_for(test_system: Option<&str>) -> Option<String> {
    let system = test_system?;
    let last = system.rsplit(':').next()?;
    (system.contains(':') && !last.is_empty()).then(|| last.to_string())
}

impl VerifyAdapter for XccdfAdapter {
    fn name(&self) -> &str {
        "xccdf"
    }

    fn tool_label(&self) -> &str {
        SCAP_TOOL
    }

    fn can_parse(&self, _path: &str, content: &str) -> bool {
        xml::root_element(content).is_some_and(|root| XCCDF_ROOTS.contains(&root.as_str()))
    }

    fn parse_content(&self, content: &str, path: &str) -> NormalizedVerifyReport {
        let mut state = XccdfState::default();
        let outcome = xml::walk(content, |event| state.on_event(event));

        let tool = tool_label_for(state.test_system.as_deref());
        let mut report = NormalizedVerifyReport::new(tool, path);
        if let Err(e) = outcome {
            report.push_diagnostic(format!(
                "Malformed XCCDF XML in {path} {e}; kept {} rule results parsed before the error",
                state.rule_results.len()
            ));
        }
        match state.test_result_count {
            0 => report.push_diagnostic(format!("No TestResult element found in {path}")),
            1 => {}
            n => report.push_diagnostic(format!(
                "{n} TestResult elements in {path}; the header of the last one was used"
            )),
        }

        report.tool_version = tool_version_for(state.test_system.as_deref());
        report.started_at = state.start_time.as_deref().and_then(parse_timestamp);
        report.finished_at = state.end_time.as_deref().and_then(parse_timestamp);
        let benchmark_id = state
            .test_result_benchmark
            .clone()
            .or_else(|| state.benchmark_id.clone());

        for entry in std::mem::take(&mut state.rule_results) {
            if entry.idref.is_empty() {
                report.push_diagnostic(format!("Skipped rule-result without idref in {path}"));
                continue;
            }
            let rule_id = short_rule_id(&entry.idref).to_string();
            let definition = state.rules.get(&rule_id);

            let status = match entry.result.as_deref() {
                Some(raw) => VerifyStatus::from_token(raw),
                None => {
                    report.push_diagnostic(format!(
                        "{rule_id} in {path} has no result; recorded as Unknown"
                    ));
                    VerifyStatus::Unknown
                }
            };
            let verified_at = match entry.time.as_deref() {
                Some(raw) => {
                    let parsed = parse_timestamp(raw);
                    if parsed.is_none() {
                        report.push_diagnostic(format!(
                            "{rule_id} in {path} has unparseable time '{raw}'"
                        ));
                    }
                    parsed
                }
                None => None,
            };

            let title = definition
                .and_then(|d| d.title.clone())
                .unwrap_or_else(|| rule_id.clone());
            let vuln_id = definition
                .and_then(|d| d.vuln_id.clone())
                .or_else(|| entry.vuln_id.clone());

            let mut result = NormalizedVerifyResult::new(tool, path, title, status)
                .with_rule_id(rule_id.clone())
                .with_severity(self.severity_of(&entry, definition))
                .with_verified_at(verified_at)
                .with_comments(entry.messages.join("\n"));
            if let Some(vuln_id) = vuln_id {
                result = result.with_vuln_id(vuln_id);
            }
            if let Some(target) = &state.target {
                result = result.with_asset_id(target.clone());
            }
            if let Some(benchmark_id) = &benchmark_id {
                result = result.with_benchmark_id(benchmark_id.clone());
            }
            if let Some(raw) = entry.result.as_deref()
                && status == VerifyStatus::Unknown
            {
                result = result.with_metadata("raw_result", raw);
            }
            report.results.push(result);
        }

        debug!(
            path,
            tool,
            count = report.results.len(),
            rules = state.rules.len(),
            "Parsed XCCDF results"
        );
        finish_report(&mut report);
        report
    }
}
