use std::fs;
use std::path::PathBuf;

use stig_consolidate::config::DiscoveryConfig;
use stig_consolidate::output::{CONSOLIDATED_CSV, CONSOLIDATED_JSON, MAPPING_MANIFEST_JSON};
use stig_consolidate::scap::{ControlRecord, GuideDescriptor, MappingMethod, ScapCandidate};
use stig_consolidate::types::{ConsolidatedVerifyResult, ToolPrecedence};
use stig_consolidate::{
    Config, ConsolidatedVerifyReport, ConsolidationPipeline, CoverageReport, FileSystemSource,
    VerifyStatus, discover_reports,
};
use chrono::{TimeZone, Utc};
use tempfile::TempDir;

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn bundle_path() -> PathBuf {
    fixtures_path().join("bundle")
}

fn load_json<T: serde::de::DeserializeOwned>(name: &str) -> T {
    let content = fs::read_to_string(fixtures_path().join("guide").join(name)).unwrap();
    serde_json::from_str(&content).unwrap()
}

fn pipeline() -> ConsolidationPipeline {
    ConsolidationPipeline::from_config(&Config::default())
        .unwrap()
        .with_merged_at(Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).unwrap())
}

fn consolidated() -> ConsolidatedVerifyReport {
    pipeline()
        .consolidate_directory(&bundle_path(), &FileSystemSource::new())
        .unwrap()
}

fn find<'a>(
    report: &'a ConsolidatedVerifyReport,
    vuln_id: &str,
    asset: &str,
) -> &'a ConsolidatedVerifyResult {
    report
        .results
        .iter()
        .find(|r| {
            r.vuln_id.as_deref() == Some(vuln_id)
                && r.asset_id.as_deref().is_some_and(|a| a.eq_ignore_ascii_case(asset))
        })
        .unwrap_or_else(|| panic!("no result for {vuln_id} on {asset}"))
}

mod discovery {
    use super::*;

    #[test]
    fn test_discovers_reports_by_extension() {
        let paths = discover_reports(&bundle_path(), &DiscoveryConfig::default()).unwrap();
        let names: Vec<String> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "db01-truncated.ckl",
                "eval-web01.xml",
                "inventory.xml",
                "scc-web01.xml",
                "web01.ckl"
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_unlistable_host_directory_is_a_diagnostic() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let locked = dir.path().join("db01");
        fs::create_dir_all(&locked).unwrap();
        fs::copy(bundle_path().join("web01.ckl"), dir.path().join("web01.ckl")).unwrap();
        fs::copy(bundle_path().join("web01.ckl"), locked.join("db01.ckl")).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        // Root ignores directory permissions.
        let enforced = fs::read_dir(&locked).is_err();

        let report = pipeline().consolidate_directory(dir.path(), &FileSystemSource::new());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        let report = report.unwrap();

        assert_eq!(report.results.len(), 3);
        if enforced {
            assert_eq!(report.source_reports.len(), 1);
            assert!(
                report
                    .diagnostic_messages
                    .iter()
                    .any(|d| d.starts_with("Failed to list") && d.contains("db01"))
            );
        }
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let result = pipeline()
            .consolidate_directory(&fixtures_path().join("missing"), &FileSystemSource::new());
        assert!(result.is_err());
    }
}

mod merge {
    use super::*;

    #[test]
    fn test_manual_review_overrides_scanners() {
        let report = consolidated();

        let supported = find(&report, "V-230221", "web01");
        assert_eq!(supported.status, VerifyStatus::Pass);
        assert_eq!(supported.tool, "Manual");
        assert_eq!(supported.contributing_tools(), vec!["Manual", "SCC"]);

        let patches = find(&report, "V-230222", "web01");
        assert_eq!(patches.status, VerifyStatus::Fail);
        assert_eq!(patches.sources.len(), 3);
        assert!(patches.evidence_paths.iter().any(|p| p.ends_with("V-230222.txt")));

        let conflict = report.conflict_for("V-230222").unwrap();
        assert_eq!(conflict.conflicting_results.len(), 3);
        assert_eq!(conflict.resolved_status, VerifyStatus::Fail);
        assert!(conflict.resolution_reason.starts_with("Resolved by Manual"));
    }

    #[test]
    fn test_single_tool_controls_survive() {
        let report = consolidated();
        assert_eq!(report.results.len(), 6);
        assert_eq!(find(&report, "V-230223", "web01").status, VerifyStatus::NotReviewed);
        assert_eq!(find(&report, "V-230224", "web01").tool, "SCC");
        assert_eq!(find(&report, "V-230225", "web01").status, VerifyStatus::NotApplicable);
        assert_eq!(find(&report, "V-230221", "db01").status, VerifyStatus::Pass);

        assert_eq!(report.conflicts.len(), 2);
        assert_eq!(report.summary.total, 6);
        assert_eq!(report.summary.pass, 3);
        assert_eq!(report.summary.fail, 1);
        assert_eq!(report.summary.not_applicable, 1);
        assert_eq!(report.summary.not_reviewed, 1);
    }

    #[test]
    fn test_bad_inputs_become_diagnostics() {
        let report = consolidated();
        let diagnostics = &report.diagnostic_messages;
        assert!(
            diagnostics
                .iter()
                .any(|d| d.contains("No adapter recognizes") && d.contains("inventory.xml"))
        );
        assert!(
            diagnostics
                .iter()
                .any(|d| d.contains("Malformed checklist XML") && d.contains("db01-truncated.ckl"))
        );
        assert_eq!(report.source_reports.len(), 4);
    }

    #[test]
    fn test_unreadable_file_is_skipped() {
        let mut paths = discover_reports(&bundle_path(), &DiscoveryConfig::default()).unwrap();
        paths.push(bundle_path().join("deleted.ckl"));
        let report = pipeline().consolidate_paths(&paths, &FileSystemSource::new());
        assert_eq!(report.results.len(), 6);
        assert!(
            report
                .diagnostic_messages
                .iter()
                .any(|d| d.starts_with("Could not read") && d.contains("deleted.ckl"))
        );
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let mut paths = discover_reports(&bundle_path(), &DiscoveryConfig::default()).unwrap();
        let source = FileSystemSource::new();
        let forward = pipeline().consolidate_paths(&paths, &source);
        paths.reverse();
        let backward = pipeline().consolidate_paths(&paths, &source);
        assert_eq!(
            serde_json::to_string(&forward).unwrap(),
            serde_json::to_string(&backward).unwrap()
        );
    }

    #[test]
    fn test_coverage_views() {
        let report = consolidated();
        let coverage = CoverageReport::from_report(&report, &ToolPrecedence::new());

        let tools: Vec<&str> = coverage.tools.iter().map(|t| t.tool.as_str()).collect();
        assert_eq!(tools, vec!["Manual", "SCC", "Evaluate-STIG"]);
        let manual = coverage.tool("manual").unwrap();
        assert_eq!(manual.reports, 2);
        assert_eq!(manual.controls_won, 4);
        assert_eq!(coverage.tool("SCC").unwrap().controls_contributed, 3);

        let overlap: Vec<(usize, usize)> = coverage
            .overlap
            .iter()
            .map(|row| (row.tool_count, row.control_count))
            .collect();
        assert_eq!(overlap, vec![(1, 4), (2, 1), (3, 1)]);
        assert_eq!(coverage.open_by_severity.total(), 1);
    }
}

mod attribution {
    use super::*;

    fn outcome() -> stig_consolidate::PipelineOutcome {
        let guide: GuideDescriptor = load_json("guide.json");
        let candidates: Vec<ScapCandidate> = load_json("candidates.json");
        let catalog: Vec<ControlRecord> = load_json("catalog.json");
        let paths = discover_reports(&bundle_path(), &DiscoveryConfig::default()).unwrap();
        pipeline()
            .run(&paths, &FileSystemSource::new(), &guide, &candidates, &catalog)
            .unwrap()
    }

    #[test]
    fn test_vendor_enhanced_benchmark_is_selected() {
        let outcome = outcome();
        let winner = outcome.selection.winner.as_ref().unwrap();
        assert_eq!(winner.pack_id, "scap-redhat-rhel8-v2r1");
        assert!(outcome.selection.has_conflict);
        assert_eq!(outcome.selection.reasons.len(), 2);
        assert!(outcome.selection.reasons[0].starts_with("Version alignment"));
        assert!(outcome.selection.reasons[1].starts_with("Vendor-enhanced preference"));
    }

    #[test]
    fn test_manifest_is_applied() {
        let outcome = outcome();
        assert_eq!(outcome.manifest.control_mappings.len(), 4);
        assert_eq!(outcome.manifest.unmapped_count, 0);
        assert!(
            outcome
                .manifest
                .control_mappings
                .iter()
                .all(|m| m.method == MappingMethod::BenchmarkOverlap)
        );

        let report = &outcome.report;
        let mapped = find(report, "V-230221", "db01");
        assert_eq!(mapped.benchmark_id.as_deref(), Some("RHEL_8_STIG"));
        assert_eq!(mapped.mapping_status(), Some("BenchmarkOverlap"));

        let absent = find(report, "V-230225", "web01");
        assert!(absent.benchmark_id.is_none());
        assert_eq!(absent.mapping_status(), Some("not_in_manifest"));
        assert_eq!(absent.status, VerifyStatus::NotApplicable);
    }

    #[test]
    fn test_no_candidates_leaves_controls_unmapped() {
        let guide: GuideDescriptor = load_json("guide.json");
        let catalog: Vec<ControlRecord> = load_json("catalog.json");
        let outcome = pipeline().attribute(consolidated(), &guide, &[], &catalog).unwrap();

        assert!(outcome.selection.winner.is_none());
        assert_eq!(outcome.manifest.unmapped_count, 4);
        assert!(outcome.manifest.selected_benchmark_pack_id.is_none());
        assert!(outcome.report.results.iter().all(|r| r.benchmark_id.is_none()));
    }
}

mod artifacts {
    use super::*;

    #[test]
    fn test_write_artifact_set() {
        let dir = TempDir::new().unwrap();
        let guide: GuideDescriptor = load_json("guide.json");
        let candidates: Vec<ScapCandidate> = load_json("candidates.json");
        let catalog: Vec<ControlRecord> = load_json("catalog.json");

        let pipeline = pipeline().with_output_directory(dir.path().join("out"));
        let outcome = pipeline
            .attribute(consolidated(), &guide, &candidates, &catalog)
            .unwrap();
        let written = pipeline.write(&outcome).unwrap();
        assert_eq!(written.files.len(), 8);

        let csv = fs::read_to_string(written.directory.join(CONSOLIDATED_CSV)).unwrap();
        assert!(csv.starts_with("VulnId,RuleId,"));
        assert_eq!(csv.lines().count(), 7);

        let json = fs::read_to_string(written.directory.join(CONSOLIDATED_JSON)).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["results"].as_array().unwrap().len(), 6);

        let manifest = fs::read_to_string(written.directory.join(MAPPING_MANIFEST_JSON)).unwrap();
        let stig = manifest.find("\"stig_pack_id\"").unwrap();
        let unmapped = manifest.find("\"unmapped_count\"").unwrap();
        assert!(stig < unmapped);
    }

    #[test]
    fn test_output_directory_must_be_a_directory() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();

        let guide: GuideDescriptor = load_json("guide.json");
        let pipeline = pipeline().with_output_directory(&blocker);
        let outcome = pipeline.attribute(consolidated(), &guide, &[], &[]).unwrap();
        assert!(pipeline.write(&outcome).is_err());
    }
}
