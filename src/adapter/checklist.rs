//! Manual review checklist (CKL) adapter.

use super::traits::{VerifyAdapter, finish_report};
use super::xml::{self, XmlEvent};
use crate::types::{
    MANUAL_TOOL, NormalizedVerifyReport, NormalizedVerifyResult, Severity, VerifyStatus,
};
use tracing::debug;

/// STIG_DATA attributes consumed into first-class result fields.
const CONSUMED_ATTRIBUTES: [&str; 4] = ["vuln_num", "rule_id", "rule_title", "severity"];

/// Adapter for CKL checklists (`CHECKLIST/STIGS/iSTIG/VULN`).
pub struct ChecklistAdapter;

impl ChecklistAdapter {
    /// Adapter with the default severity policy.
    pub fn new() -> Self {
        Self
    }
}

impl Default for ChecklistAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default)]
struct VulnEntry {
    attributes: Vec<(String, Vec<String>)>,
    status: Option<String>,
    finding_details: Option<String>,
    comments: Option<String>,
    severity_override: Option<String>,
}

impl VulnEntry {
    fn first(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .and_then(|(_, values)| values.first())
            .map(String::as_str)
    }
}

#[derive(Debug, Default)]
struct ChecklistState {
    root: Option<String>,
    in_asset: bool,
    host_name: Option<String>,
    sid_name: Option<String>,
    sid_data: Option<String>,
    stig_id: Option<String>,
    stig_version: Option<String>,
    vuln: Option<VulnEntry>,
    vuln_index: usize,
    attribute_name: Option<String>,
    attribute_values: Vec<String>,
    results: Vec<NormalizedVerifyResult>,
    diagnostics: Vec<String>,
}

impl ChecklistState {
    fn on_event(&mut self, event: XmlEvent, path: &str) {
        match event {
            XmlEvent::Open(element) => {
                if self.root.is_none() {
                    self.root = Some(element.name.clone());
                }
                match element.name.as_str() {
                    "asset" => self.in_asset = true,
                    "istig" => {
                        self.stig_id = None;
                        self.stig_version = None;
                    }
                    "si_data" => {
                        self.sid_name = None;
                        self.sid_data = None;
                    }
                    "vuln" => self.vuln = Some(VulnEntry::default()),
                    "stig_data" => {
                        self.attribute_name = None;
                        self.attribute_values.clear();
                    }
                    _ => {}
                }
            }
            XmlEvent::Close { name, text } => self.on_close(&name, text, path),
        }
    }

    fn on_close(&mut self, name: &str, text: String, path: &str) {
        match name {
            "asset" => self.in_asset = false,
            "host_name" if self.in_asset && !text.is_empty() => self.host_name = Some(text),
            "sid_name" => self.sid_name = Some(text.to_ascii_lowercase()),
            "sid_data" => self.sid_data = Some(text),
            "si_data" => match (self.sid_name.as_deref(), self.sid_data.take()) {
                (Some("stigid"), Some(data)) => self.stig_id = Some(data),
                (Some("version"), Some(data)) => self.stig_version = Some(data),
                _ => {}
            },
            "vuln_attribute" => self.attribute_name = Some(text),
            "attribute_data" if !text.is_empty() => self.attribute_values.push(text),
            "stig_data" => {
                if let (Some(vuln), Some(attribute)) = (self.vuln.as_mut(), self.attribute_name.take())
                {
                    vuln.attributes
                        .push((attribute, std::mem::take(&mut self.attribute_values)));
                }
            }
            "status" => {
                if let Some(vuln) = self.vuln.as_mut() {
                    vuln.status = Some(text);
                }
            }
            "finding_details" => {
                if let Some(vuln) = self.vuln.as_mut() {
                    vuln.finding_details = Some(text);
                }
            }
            "comments" => {
                if let Some(vuln) = self.vuln.as_mut() {
                    vuln.comments = Some(text);
                }
            }
            "severity_override" => {
                if let Some(vuln) = self.vuln.as_mut() {
                    vuln.severity_override = Some(text);
                }
            }
            "vuln" => {
                self.vuln_index += 1;
                if let Some(entry) = self.vuln.take() {
                    self.finish_vuln(entry, path);
                }
            }
            _ => {}
        }
    }

    fn finish_vuln(&mut self, entry: VulnEntry, path: &str) {
        let vuln_id = entry.first("vuln_num");
        let rule_id = entry.first("rule_id");
        let Some(title) = entry.first("rule_title").or(vuln_id).or(rule_id) else {
            self.diagnostics.push(format!(
                "Skipped VULN #{} in {}: no Vuln_Num, Rule_ID or Rule_Title",
                self.vuln_index, path
            ));
            return;
        };
        let key = vuln_id.or(rule_id).unwrap_or(title).to_string();

        let status = match entry.status.as_deref() {
            None => {
                self.diagnostics
                    .push(format!("{key} in {path} has no STATUS; recorded as Unknown"));
                VerifyStatus::Unknown
            }
            Some(raw) => {
                let status = VerifyStatus::from_token(raw);
                if status == VerifyStatus::Unknown && !raw.eq_ignore_ascii_case("unknown") {
                    self.diagnostics
                        .push(format!("{key} in {path} has unrecognized status '{raw}'"));
                }
                status
            }
        };

        let severity = entry
            .severity_override
            .as_deref()
            .map(Severity::from_token)
            .filter(Severity::is_known)
            .or_else(|| entry.first("severity").map(Severity::from_token))
            .unwrap_or_default();

        let mut result = NormalizedVerifyResult::new(MANUAL_TOOL, path, title, status)
            .with_severity(severity);
        if let Some(vuln_id) = vuln_id {
            result = result.with_vuln_id(vuln_id);
        }
        if let Some(rule_id) = rule_id {
            result = result.with_rule_id(rule_id);
        }
        if let Some(host) = &self.host_name {
            result = result.with_asset_id(host.clone());
        }
        if let Some(stig_id) = &self.stig_id {
            result = result.with_benchmark_id(stig_id.clone());
        }
        if let Some(comments) = entry.comments.clone() {
            result = result.with_comments(comments);
        }

        for (attribute, values) in &entry.attributes {
            let key = attribute.to_ascii_lowercase();
            if CONSUMED_ATTRIBUTES.contains(&key.as_str()) || values.is_empty() {
                continue;
            }
            result.metadata.entry(key).or_insert_with(|| values.join("; "));
        }
        if let Some(details) = entry.finding_details.filter(|d| !d.is_empty()) {
            result = result.with_metadata("finding_details", details);
        }
        if let Some(severity_override) = entry.severity_override.filter(|s| !s.is_empty()) {
            result = result.with_metadata("severity_override", severity_override);
        }
        if let Some(version) = &self.stig_version {
            result = result.with_metadata("benchmark_version", version.clone());
        }

        self.results.push(result);
    }
}

impl VerifyAdapter for ChecklistAdapter {
    fn name(&self) -> &str {
        "checklist"
    }

    fn tool_label(&self) -> &str {
        MANUAL_TOOL
    }

    fn can_parse(&self, path: &str, content: &str) -> bool {
        path.to_lowercase().ends_with(".ckl")
            || xml::root_element(content).is_some_and(|root| root == "checklist")
    }

    fn parse_content(&self, content: &str, path: &str) -> NormalizedVerifyReport {
        let mut state = ChecklistState::default();
        let outcome = xml::walk(content, |event| state.on_event(event, path));

        let mut report = NormalizedVerifyReport::new(MANUAL_TOOL, path);
        if let Err(e) = outcome {
            report.push_diagnostic(format!(
                "Malformed checklist XML in {path} {e}; kept {} results parsed before the error",
                state.results.len()
            ));
        }
        if state.root.as_deref() != Some("checklist") {
            report.push_diagnostic(format!("Missing CHECKLIST root element in {path}"));
        }
        report.diagnostic_messages.append(&mut state.diagnostics);
        report.results = state.results;

        debug!(path, count = report.results.len(), "Parsed checklist");
        finish_report(&mut report);
        report
    }
}
