use crate::reporter::Reporter;
use crate::types::ConsolidatedVerifyReport;

pub struct JsonReporter {
    pretty: bool,
}

impl JsonReporter {
    /// JSON reporter with pretty printing.
    pub fn new() -> Self {
        Self { pretty: true }
    }

    /// Toggle pretty printing.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub(crate) fn render<T: serde::Serialize + ?Sized>(&self, value: &T) -> String {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        rendered.unwrap_or_else(|e| format!(r#"{{"error": "Failed to serialize report: {}"}}"#, e))
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for JsonReporter {
    fn report(&self, report: &ConsolidatedVerifyReport) -> String {
        self.render(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::MergeOrchestrator;
    use crate::test_utils::fixtures::{create_report, create_result, ts};
    use crate::types::{MANUAL_TOOL, SCAP_TOOL, VerifyStatus};

    fn report() -> ConsolidatedVerifyReport {
        MergeOrchestrator::new().with_merged_at(ts(4, 12)).merge(&[
            create_report(
                SCAP_TOOL,
                vec![create_result(SCAP_TOOL, "V-1", "SV-1r1_rule", VerifyStatus::Fail)],
            ),
            create_report(
                MANUAL_TOOL,
                vec![create_result(MANUAL_TOOL, "V-1", "SV-1r1_rule", VerifyStatus::Pass)],
            ),
        ])
    }

    #[test]
    fn test_json_output_structure() {
        let output = JsonReporter::new().report(&report());
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(parsed["merged_at"], "2026-03-04T12:00:00Z");
        assert_eq!(parsed["results"][0]["vuln_id"], "V-1");
        assert_eq!(parsed["results"][0]["status"], "Pass");
        assert_eq!(parsed["results"][0]["tool"], "Manual");
        assert_eq!(parsed["conflicts"][0]["resolved_status"], "Pass");
        assert_eq!(parsed["summary"]["pass"], 1);
        assert_eq!(parsed["source_reports"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_compact_output() {
        let output = JsonReporter::new().with_pretty(false).report(&report());
        assert!(!output.contains('\n'));
        assert!(output.starts_with("{\"merged_at\":"));
    }

    #[test]
    fn test_json_default_trait() {
        let output = JsonReporter::default().report(&report());
        assert!(output.contains("\"total\": 1"));
    }
}
