//! Manifest application.

use tracing::debug;

use super::types::{ScapMappingManifest, control_key};
use crate::types::{ConsolidatedVerifyReport, MAPPING_STATUS_KEY};

/// Mapping status for results whose control is absent from the manifest.
pub const NOT_IN_MANIFEST: &str = "not_in_manifest";

/// Stamp benchmark attribution onto a consolidated report.
///
/// Only `benchmark_id` and the `mapping_status` metadata entry change.
/// Without a manifest the report is returned as-is.
pub fn apply_mapping_manifest(
    mut report: ConsolidatedVerifyReport,
    manifest: Option<&ScapMappingManifest>,
) -> ConsolidatedVerifyReport {
    let Some(manifest) = manifest else {
        return report;
    };

    let index = manifest.index();
    let mut missing = 0usize;
    for result in &mut report.results {
        let key = control_key(result.vuln_id.as_deref(), result.rule_id.as_deref());
        match index.get(&key) {
            Some(mapping) => {
                result.benchmark_id = mapping.benchmark_id.clone();
                result
                    .metadata
                    .insert(MAPPING_STATUS_KEY.to_string(), mapping.status_label().to_string());
            }
            None => {
                missing += 1;
                result.benchmark_id = None;
                result
                    .metadata
                    .insert(MAPPING_STATUS_KEY.to_string(), NOT_IN_MANIFEST.to_string());
            }
        }
    }

    debug!(
        guide = %manifest.stig_name,
        results = report.results.len(),
        not_in_manifest = missing,
        "Mapping manifest applied"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::MergeOrchestrator;
    use crate::scap::types::{GuideDescriptor, MappingMethod, ScapControlMapping};
    use crate::test_utils::fixtures::{create_report, create_result, ts};
    use crate::types::{EVALUATE_STIG_TOOL, MANUAL_TOOL, VerifyStatus};

    fn consolidated() -> ConsolidatedVerifyReport {
        MergeOrchestrator::new().with_merged_at(ts(10, 0)).merge(&[
            create_report(
                MANUAL_TOOL,
                vec![
                    create_result(MANUAL_TOOL, "V-1", "SV-1r1_rule", VerifyStatus::Pass),
                    create_result(MANUAL_TOOL, "V-2", "SV-2r1_rule", VerifyStatus::Fail),
                ],
            ),
            create_report(
                EVALUATE_STIG_TOOL,
                vec![create_result(EVALUATE_STIG_TOOL, "V-1", "SV-1r1_rule", VerifyStatus::Fail)],
            ),
        ])
    }

    fn manifest() -> ScapMappingManifest {
        let guide = GuideDescriptor::new("stig", "RHEL 8 V2R1", ts(1, 0));
        ScapMappingManifest::new(
            &guide,
            None,
            vec![ScapControlMapping {
                vuln_id: Some("v-1".to_string()),
                rule_id: Some("SV-1R1_RULE".to_string()),
                benchmark_id: Some("RHEL_8_STIG".to_string()),
                method: MappingMethod::BenchmarkOverlap,
                confidence: 1.0,
                reason: None,
            }],
        )
    }

    #[test]
    fn test_apply_sets_benchmark_and_status() {
        let before = consolidated();
        let after = apply_mapping_manifest(before.clone(), Some(&manifest()));

        let v1 = after.results.iter().find(|r| r.vuln_id.as_deref() == Some("V-1")).unwrap();
        assert_eq!(v1.benchmark_id.as_deref(), Some("RHEL_8_STIG"));
        assert_eq!(v1.mapping_status(), Some("BenchmarkOverlap"));

        let v2 = after.results.iter().find(|r| r.vuln_id.as_deref() == Some("V-2")).unwrap();
        assert!(v2.benchmark_id.is_none());
        assert_eq!(v2.mapping_status(), Some(NOT_IN_MANIFEST));

        for (old, new) in before.results.iter().zip(&after.results) {
            assert_eq!(old.status, new.status);
            assert_eq!(old.tool, new.tool);
            assert_eq!(old.sources, new.sources);
        }
        assert_eq!(before.conflicts, after.conflicts);
        assert_eq!(before.summary, after.summary);
    }

    #[test]
    fn test_apply_without_manifest_is_identity() {
        let before = consolidated();
        let after = apply_mapping_manifest(before.clone(), None);
        assert_eq!(before, after);
    }

    #[test]
    fn test_unmapped_reason_is_recorded() {
        let guide = GuideDescriptor::new("stig", "RHEL 8 V2R1", ts(1, 0));
        let manifest = ScapMappingManifest::new(
            &guide,
            None,
            vec![ScapControlMapping {
                vuln_id: Some("V-2".to_string()),
                rule_id: Some("SV-2r1_rule".to_string()),
                benchmark_id: None,
                method: MappingMethod::Unmapped,
                confidence: 0.0,
                reason: Some("no_scap_mapping".to_string()),
            }],
        );
        let after = apply_mapping_manifest(consolidated(), Some(&manifest));
        let v2 = after.results.iter().find(|r| r.vuln_id.as_deref() == Some("V-2")).unwrap();
        assert_eq!(v2.mapping_status(), Some("no_scap_mapping"));
        assert!(v2.benchmark_id.is_none());
    }

    #[test]
    fn test_apply_full_catalog() {
        let results = (0..500)
            .map(|n| create_result(MANUAL_TOOL, &format!("V-{n}"), &format!("SV-{n}r1_rule"), VerifyStatus::Pass))
            .collect();
        let report = MergeOrchestrator::new()
            .with_merged_at(ts(10, 0))
            .merge(&[create_report(MANUAL_TOOL, results)]);

        let mappings = (0..500)
            .rev()
            .filter(|n| n % 10 != 0)
            .map(|n| ScapControlMapping {
                vuln_id: Some(format!("V-{n}")),
                rule_id: Some(format!("sv-{n}R1_rule")),
                benchmark_id: Some(format!("BENCH_{}", n % 3)),
                method: MappingMethod::BenchmarkOverlap,
                confidence: 1.0,
                reason: None,
            })
            .collect();
        let guide = GuideDescriptor::new("stig", "RHEL 8 V2R1", ts(1, 0));
        let manifest = ScapMappingManifest::new(&guide, None, mappings);

        let after = apply_mapping_manifest(report, Some(&manifest));
        assert_eq!(after.results.len(), 500);
        for result in &after.results {
            let n: usize = result.vuln_id.as_deref().unwrap()[2..].parse().unwrap();
            if n % 10 == 0 {
                assert!(result.benchmark_id.is_none());
                assert_eq!(result.mapping_status(), Some(NOT_IN_MANIFEST));
            } else {
                assert_eq!(result.benchmark_id, Some(format!("BENCH_{}", n % 3)));
                assert_eq!(result.mapping_status(), Some("BenchmarkOverlap"));
            }
        }
    }
}
