#[cfg(test)]
pub mod fixtures {
    use crate::types::{NormalizedVerifyReport, NormalizedVerifyResult, VerifyStatus};
    use chrono::{DateTime, TimeZone, Utc};

    pub fn ts(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap()
    }

    pub fn create_result(
        tool: &str,
        vuln_id: &str,
        rule_id: &str,
        status: VerifyStatus,
    ) -> NormalizedVerifyResult {
        NormalizedVerifyResult::new(
            tool,
            format!("{}.xml", tool.to_lowercase()),
            format!("Title for {vuln_id}"),
            status,
        )
        .with_vuln_id(vuln_id)
        .with_rule_id(rule_id)
    }

    pub fn create_report(tool: &str, results: Vec<NormalizedVerifyResult>) -> NormalizedVerifyReport {
        NormalizedVerifyReport::new(tool, format!("results/{}", tool.to_lowercase()))
            .with_results(results)
    }

    fn escape(raw: &str) -> String {
        raw.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
    }

    fn stig_data(attribute: &str, value: &str) -> String {
        format!(
            "<STIG_DATA><VULN_ATTRIBUTE>{attribute}</VULN_ATTRIBUTE><ATTRIBUTE_DATA>{}</ATTRIBUTE_DATA></STIG_DATA>\n",
            escape(value)
        )
    }

    /// CKL document with one VULN per `(vuln_id, rule_id, status, comments)`.
    pub fn checklist_xml(host: &str, stig_id: &str, vulns: &[(&str, &str, &str, &str)]) -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<CHECKLIST>\n");
        out.push_str(&format!(
            "<ASSET><ROLE>None</ROLE><HOST_NAME>{}</HOST_NAME></ASSET>\n",
            escape(host)
        ));
        out.push_str("<STIGS><iSTIG>\n<STIG_INFO>\n");
        out.push_str("<SI_DATA><SID_NAME>version</SID_NAME><SID_DATA>1</SID_DATA></SI_DATA>\n");
        out.push_str(&format!(
            "<SI_DATA><SID_NAME>stigid</SID_NAME><SID_DATA>{}</SID_DATA></SI_DATA>\n",
            escape(stig_id)
        ));
        out.push_str("</STIG_INFO>\n");
        for (vuln_id, rule_id, status, comments) in vulns {
            out.push_str("<VULN>\n");
            out.push_str(&stig_data("Vuln_Num", vuln_id));
            out.push_str(&stig_data("Severity", "medium"));
            out.push_str(&stig_data("Group_Title", "SRG-OS-000001"));
            out.push_str(&stig_data("Rule_ID", rule_id));
            out.push_str(&stig_data("Rule_Title", &format!("Title for {vuln_id}")));
            out.push_str(&format!("<STATUS>{}</STATUS>\n", escape(status)));
            out.push_str("<FINDING_DETAILS></FINDING_DETAILS>\n");
            out.push_str(&format!("<COMMENTS>{}</COMMENTS>\n", escape(comments)));
            out.push_str("</VULN>");
        }
        out.push_str("</iSTIG></STIGS></CHECKLIST>\n");
        out
    }

    /// Evaluate-STIG result document with one Finding per
    /// `(vuln_id, rule_id, status, timestamp)`.
    pub fn evaluate_stig_xml(
        host: &str,
        end_time: &str,
        findings: &[(&str, &str, &str, Option<&str>)],
    ) -> String {
        let mut out = format!(
            "<?xml version=\"1.0\"?>\n<EvaluateSTIG Version=\"1.2404.0\" StartTime=\"2026-03-01T09:00:00Z\" EndTime=\"{}\" ComputerName=\"{}\">\n",
            escape(end_time),
            escape(host)
        );
        out.push_str("<STIG Name=\"Red Hat Enterprise Linux 8 STIG\" BenchmarkId=\"RHEL_8_STIG\">\n");
        for (vuln_id, rule_id, status, timestamp) in findings {
            let time_attr = timestamp
                .map(|t| format!(" Timestamp=\"{}\"", escape(t)))
                .unwrap_or_default();
            out.push_str(&format!(
                "<Finding VulnID=\"{vuln_id}\" RuleID=\"{rule_id}\" RuleTitle=\"Title for {vuln_id}\" Severity=\"CAT II\" Status=\"{}\"{time_attr}>\n",
                escape(status)
            ));
            out.push_str("<Comments>Checked by Evaluate-STIG</Comments>\n");
            out.push_str(&format!("<Evidence>C:\\Evidence\\{vuln_id}.txt</Evidence>\n"));
            out.push_str("</Finding>\n");
        }
        out.push_str("</STIG>\n</EvaluateSTIG>\n");
        out
    }

    /// XCCDF 1.2 benchmark with an embedded TestResult, one rule per
    /// `(vuln_id, rule_id, result)`.
    pub fn xccdf_xml(test_system: &str, host: &str, results: &[(&str, &str, &str)]) -> String {
        let benchmark = "xccdf_mil.disa.stig_benchmark_RHEL_8_STIG";
        let mut out = format!(
            "<?xml version=\"1.0\"?>\n<cdf:Benchmark xmlns:cdf=\"http://checklists.nist.gov/xccdf/1.2\" id=\"{benchmark}\">\n"
        );
        for (vuln_id, rule_id, _) in results {
            out.push_str(&format!(
                "<cdf:Group id=\"xccdf_mil.disa.stig_group_{vuln_id}\">\n<cdf:Rule id=\"xccdf_mil.disa.stig_rule_{rule_id}\" severity=\"medium\" weight=\"10.0\">\n<cdf:title>Title for {vuln_id}</cdf:title>\n</cdf:Rule>\n</cdf:Group>\n"
            ));
        }
        out.push_str(&format!(
            "<cdf:TestResult id=\"xccdf_mil.disa.stig_testresult_1\" start-time=\"2026-03-02T08:00:00\" end-time=\"2026-03-02T08:30:00\" test-system=\"{}\">\n",
            escape(test_system)
        ));
        out.push_str(&format!("<cdf:benchmark href=\"#{benchmark}\" id=\"{benchmark}\"/>\n"));
        out.push_str(&format!("<cdf:target>{}</cdf:target>\n", escape(host)));
        for (_, rule_id, result) in results {
            out.push_str(&format!(
                "<cdf:rule-result idref=\"xccdf_mil.disa.stig_rule_{rule_id}\" time=\"2026-03-02T08:15:00\">\n<cdf:result>{}</cdf:result>\n</cdf:rule-result>\n",
                escape(result)
            ));
        }
        out.push_str("</cdf:TestResult>\n</cdf:Benchmark>\n");
        out
    }
}
