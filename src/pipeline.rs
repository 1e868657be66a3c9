//! End-to-end consolidation pipeline.
//!
//! Wires the adapter registry, the merge orchestrator and the SCAP
//! attribution stages together from one [`Config`].

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::adapter::AdapterRegistry;
use crate::aggregator::MergeOrchestrator;
use crate::config::{Config, DiscoveryConfig};
use crate::error::Result;
use crate::input::{ReportSource, scan_reports};
use crate::output::{ReportWriter, WrittenArtifacts};
use crate::scap::{
    CanonicalBenchmarkSelector, ControlRecord, GuideDescriptor, MappingHeuristic,
    MappingManifestBuilder, ScapCandidate, ScapMappingManifest, ScapSelectionResult,
    apply_mapping_manifest,
};
use crate::types::ConsolidatedVerifyReport;

/// Everything one attributed consolidation produces.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutcome {
    pub report: ConsolidatedVerifyReport,
    pub selection: ScapSelectionResult,
    pub manifest: ScapMappingManifest,
}

/// Read → adapt → merge → select → map → apply.
pub struct ConsolidationPipeline {
    registry: AdapterRegistry,
    orchestrator: MergeOrchestrator,
    selector: CanonicalBenchmarkSelector,
    manifest_builder: MappingManifestBuilder,
    writer: ReportWriter,
    discovery: DiscoveryConfig,
}

impl ConsolidationPipeline {
    /// Build every stage from a validated configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let orchestrator = MergeOrchestrator::from_config(&config.merge);
        let writer =
            ReportWriter::from_config(&config.output).with_precedence(orchestrator.precedence().clone());
        Ok(Self {
            registry: AdapterRegistry::with_policy(config.severity.clone()),
            orchestrator,
            selector: CanonicalBenchmarkSelector::from_config(&config.selector),
            manifest_builder: MappingManifestBuilder::new(),
            writer,
            discovery: config.discovery.clone(),
        })
    }

    /// Install a heuristic for controls the benchmark overlap leaves unmapped.
    pub fn with_heuristic(mut self, heuristic: Box<dyn MappingHeuristic>) -> Self {
        self.manifest_builder = self.manifest_builder.with_heuristic(heuristic);
        self
    }

    /// Pin the `merged_at` stamp of consolidated reports.
    pub fn with_merged_at(mut self, merged_at: DateTime<Utc>) -> Self {
        self.orchestrator = self.orchestrator.with_merged_at(merged_at);
        self
    }

    /// Write artifacts to `directory` instead of the configured one.
    pub fn with_output_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.writer = self.writer.with_directory(directory);
        self
    }

    /// Adapter registry, for registering extra adapters.
    pub fn registry_mut(&mut self) -> &mut AdapterRegistry {
        &mut self.registry
    }

    /// Read, adapt and merge `paths`. Unreadable or unrecognized files become
    /// diagnostics.
    pub fn consolidate_paths(&self, paths: &[PathBuf], source: &dyn ReportSource) -> ConsolidatedVerifyReport {
        debug!(files = paths.len(), "Consolidating report files");
        self.orchestrator.consolidate_files(paths, source, &self.registry)
    }

    /// Discover report files under `dir` and consolidate them.
    ///
    /// Subdirectories the walk cannot list are named in the diagnostics.
    pub fn consolidate_directory(
        &self,
        dir: &Path,
        source: &dyn ReportSource,
    ) -> Result<ConsolidatedVerifyReport> {
        let found = scan_reports(dir, &self.discovery)?;
        let mut report = self.consolidate_paths(&found.paths, source);
        let mut diagnostics = found.diagnostics();
        diagnostics.append(&mut report.diagnostic_messages);
        report.diagnostic_messages = diagnostics;
        Ok(report)
    }

    /// Consolidate independent batches (one per bundle or host) in parallel.
    /// Output order follows `batches`.
    pub fn consolidate_batches(
        &self,
        batches: &[Vec<PathBuf>],
        source: &dyn ReportSource,
    ) -> Vec<ConsolidatedVerifyReport> {
        batches
            .par_iter()
            .map(|paths| self.consolidate_paths(paths, source))
            .collect()
    }

    /// Select the canonical benchmark, build the manifest and apply it.
    pub fn attribute(
        &self,
        report: ConsolidatedVerifyReport,
        guide: &GuideDescriptor,
        candidates: &[ScapCandidate],
        catalog: &[ControlRecord],
    ) -> Result<PipelineOutcome> {
        let selection = self.selector.select(guide, candidates);
        let manifest = self
            .manifest_builder
            .build(guide, selection.winner.as_ref(), catalog)?;
        let report = apply_mapping_manifest(report, Some(&manifest));

        info!(
            guide = %guide.name,
            results = report.results.len(),
            conflicts = report.conflicts.len(),
            mapped = manifest.mapped_count(),
            unmapped = manifest.unmapped_count,
            "Attribution finished"
        );
        Ok(PipelineOutcome {
            report,
            selection,
            manifest,
        })
    }

    /// [`consolidate_paths`](Self::consolidate_paths) followed by
    /// [`attribute`](Self::attribute).
    pub fn run(
        &self,
        paths: &[PathBuf],
        source: &dyn ReportSource,
        guide: &GuideDescriptor,
        candidates: &[ScapCandidate],
        catalog: &[ControlRecord],
    ) -> Result<PipelineOutcome> {
        let report = self.consolidate_paths(paths, source);
        self.attribute(report, guide, candidates, catalog)
    }

    /// Write the outcome's artifacts, manifest included.
    pub fn write(&self, outcome: &PipelineOutcome) -> Result<WrittenArtifacts> {
        self.writer.write(&outcome.report, Some(&outcome.manifest))
    }
}
