//! Mapping manifest builder.
//!
//! Attributes every catalog control to the selected benchmark, or leaves it
//! `Unmapped`. A control is never attributed to a benchmark the selected
//! candidate does not carry.

use tracing::{debug, info};

use super::types::{
    ControlRecord, GuideDescriptor, MappingMethod, ScapCandidate, ScapControlMapping,
    ScapMappingManifest,
};
use crate::error::{ConsolidateError, Result};

/// Reason recorded on every unmapped control.
pub const NO_SCAP_MAPPING: &str = "no_scap_mapping";

/// A partial-confidence attribution proposed by a [`MappingHeuristic`].
#[derive(Debug, Clone, PartialEq)]
pub struct HeuristicProposal {
    pub benchmark_id: String,
    /// Strictly between 0 and 1.
    pub confidence: f64,
    pub reason: Option<String>,
}

/// Secondary attribution for controls the benchmark-id comparison left
/// unmapped. Proposals become `StrictTagMatch` mappings.
pub trait MappingHeuristic: Send + Sync {
    fn name(&self) -> &str;

    fn propose(&self, control: &ControlRecord, winner: &ScapCandidate) -> Option<HeuristicProposal>;
}

/// Builds a [`ScapMappingManifest`] from the selector's winner and the
/// guide's control catalog.
#[derive(Default)]
pub struct MappingManifestBuilder {
    heuristic: Option<Box<dyn MappingHeuristic>>,
}

impl MappingManifestBuilder {
    /// Builder without a heuristic; only benchmark overlap maps controls.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consult `heuristic` for controls left unmapped.
    pub fn with_heuristic(mut self, heuristic: Box<dyn MappingHeuristic>) -> Self {
        self.heuristic = Some(heuristic);
        self
    }

    /// Build the manifest.
    ///
    /// Only a heuristic breaking the mapping contract (confidence outside
    /// `(0, 1)` or a benchmark the winner does not carry) is an error.
    pub fn build(
        &self,
        guide: &GuideDescriptor,
        winner: Option<&ScapCandidate>,
        catalog: &[ControlRecord],
    ) -> Result<ScapMappingManifest> {
        let mut mappings = Vec::with_capacity(catalog.len());
        for control in catalog {
            mappings.push(self.map_control(control, winner)?);
        }

        let manifest = ScapMappingManifest::new(guide, winner, mappings);
        info!(
            guide = %guide.name,
            benchmark = ?manifest.selected_benchmark_pack_id,
            controls = manifest.control_mappings.len(),
            unmapped = manifest.unmapped_count,
            "Mapping manifest built"
        );
        Ok(manifest)
    }

    fn map_control(
        &self,
        control: &ControlRecord,
        winner: Option<&ScapCandidate>,
    ) -> Result<ScapControlMapping> {
        let Some(winner) = winner else {
            return Ok(unmapped(control));
        };

        if let Some(own) = control
            .benchmark_id
            .as_deref()
            .and_then(|id| winner.benchmark_matching(id))
        {
            return Ok(ScapControlMapping {
                vuln_id: control.vuln_id.clone(),
                rule_id: control.rule_id.clone(),
                benchmark_id: Some(own.to_string()),
                method: MappingMethod::BenchmarkOverlap,
                confidence: 1.0,
                reason: None,
            });
        }

        let Some(heuristic) = &self.heuristic else {
            return Ok(unmapped(control));
        };
        let Some(proposal) = heuristic.propose(control, winner) else {
            return Ok(unmapped(control));
        };

        let label = control
            .vuln_id
            .as_deref()
            .or(control.rule_id.as_deref())
            .unwrap_or(&control.title);
        if !(proposal.confidence > 0.0 && proposal.confidence < 1.0) {
            return Err(ConsolidateError::ContractViolation(format!(
                "heuristic '{}' proposed confidence {} for {}; expected a value strictly between 0 and 1",
                heuristic.name(),
                proposal.confidence,
                label
            )));
        }
        let Some(own) = winner.benchmark_matching(&proposal.benchmark_id) else {
            return Err(ConsolidateError::ContractViolation(format!(
                "heuristic '{}' mapped {} to benchmark '{}', which '{}' does not carry",
                heuristic.name(),
                label,
                proposal.benchmark_id,
                winner.pack_id
            )));
        };

        debug!(control = label, heuristic = heuristic.name(), "Heuristic mapping accepted");
        Ok(ScapControlMapping {
            vuln_id: control.vuln_id.clone(),
            rule_id: control.rule_id.clone(),
            benchmark_id: Some(own.to_string()),
            method: MappingMethod::StrictTagMatch,
            confidence: proposal.confidence,
            reason: proposal.reason,
        })
    }
}

fn unmapped(control: &ControlRecord) -> ScapControlMapping {
    ScapControlMapping {
        vuln_id: control.vuln_id.clone(),
        rule_id: control.rule_id.clone(),
        benchmark_id: None,
        method: MappingMethod::Unmapped,
        confidence: 0.0,
        reason: Some(NO_SCAP_MAPPING.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn guide() -> GuideDescriptor {
        GuideDescriptor::new("stig-rhel8", "RHEL 8 STIG V2R1", Utc::now()).with_benchmark_id("RHEL_8_STIG")
    }

    fn winner() -> ScapCandidate {
        ScapCandidate::new("scap-rhel8", "RHEL 8 V2R1 SCAP", Utc::now()).with_benchmark_id("RHEL_8_STIG")
    }

    fn catalog() -> Vec<ControlRecord> {
        vec![
            ControlRecord::new("One")
                .with_vuln_id("V-1")
                .with_rule_id("SV-1r1_rule")
                .with_benchmark_id("rhel_8_stig"),
            ControlRecord::new("Two")
                .with_vuln_id("V-2")
                .with_rule_id("SV-2r1_rule")
                .with_benchmark_id("Windows_11_STIG"),
            ControlRecord::new("Three").with_vuln_id("V-3"),
        ]
    }

    struct FixedHeuristic {
        benchmark: &'static str,
        confidence: f64,
    }

    impl MappingHeuristic for FixedHeuristic {
        fn name(&self) -> &str {
            "fixed"
        }

        fn propose(&self, _control: &ControlRecord, _winner: &ScapCandidate) -> Option<HeuristicProposal> {
            Some(HeuristicProposal {
                benchmark_id: self.benchmark.to_string(),
                confidence: self.confidence,
                reason: Some("tag_match".to_string()),
            })
        }
    }

    #[test]
    fn test_no_candidates_leaves_everything_unmapped() {
        let catalog = vec![
            ControlRecord::new("One").with_vuln_id("V-1").with_benchmark_id("RHEL_8_STIG"),
            ControlRecord::new("Two").with_vuln_id("V-2"),
        ];
        let manifest = MappingManifestBuilder::new().build(&guide(), None, &catalog).unwrap();
        assert_eq!(manifest.unmapped_count, 2);
        assert!(manifest.control_mappings.iter().all(|m| {
            m.method == MappingMethod::Unmapped
                && m.reason.as_deref() == Some("no_scap_mapping")
                && m.benchmark_id.is_none()
                && m.confidence == 0.0
        }));
    }

    #[test]
    fn test_overlap_uses_winner_spelling_and_never_borrows() {
        let winner = winner();
        let manifest = MappingManifestBuilder::new()
            .build(&guide(), Some(&winner), &catalog())
            .unwrap();

        let first = &manifest.control_mappings[0];
        assert_eq!(first.method, MappingMethod::BenchmarkOverlap);
        assert_eq!(first.confidence, 1.0);
        assert_eq!(first.benchmark_id.as_deref(), Some("RHEL_8_STIG"));
        assert_eq!(manifest.control_mappings[1].method, MappingMethod::Unmapped);
        assert_eq!(manifest.control_mappings[2].method, MappingMethod::Unmapped);
        assert_eq!(manifest.unmapped_count, 2);
        assert_eq!(manifest.selected_benchmark_pack_id.as_deref(), Some("scap-rhel8"));

        for mapping in &manifest.control_mappings {
            if let Some(id) = &mapping.benchmark_id {
                assert!(winner.benchmark_ids.contains(id));
            }
        }
    }

    #[test]
    fn test_heuristic_fills_unmapped_controls() {
        let builder = MappingManifestBuilder::new().with_heuristic(Box::new(FixedHeuristic {
            benchmark: "RHEL-8-STIG",
            confidence: 0.6,
        }));
        let manifest = builder.build(&guide(), Some(&winner()), &catalog()).unwrap();
        let second = &manifest.control_mappings[1];
        assert_eq!(second.method, MappingMethod::StrictTagMatch);
        assert_eq!(second.benchmark_id.as_deref(), Some("RHEL_8_STIG"));
        assert_eq!(second.reason.as_deref(), Some("tag_match"));
        assert_eq!(manifest.unmapped_count, 0);
    }

    #[test]
    fn test_heuristic_contract_violations() {
        let bad_confidence = MappingManifestBuilder::new().with_heuristic(Box::new(FixedHeuristic {
            benchmark: "RHEL_8_STIG",
            confidence: 1.0,
        }));
        let err = bad_confidence.build(&guide(), Some(&winner()), &catalog()).unwrap_err();
        assert!(matches!(err, ConsolidateError::ContractViolation(_)));

        let foreign = MappingManifestBuilder::new().with_heuristic(Box::new(FixedHeuristic {
            benchmark: "Windows_11_STIG",
            confidence: 0.5,
        }));
        let err = foreign.build(&guide(), Some(&winner()), &catalog()).unwrap_err();
        assert!(err.to_string().contains("does not carry"));
    }

    #[test]
    fn test_heuristic_not_consulted_without_winner() {
        let builder = MappingManifestBuilder::new().with_heuristic(Box::new(FixedHeuristic {
            benchmark: "RHEL_8_STIG",
            confidence: 0.5,
        }));
        let manifest = builder.build(&guide(), None, &catalog()).unwrap();
        assert_eq!(manifest.unmapped_count, 3);
    }
}
