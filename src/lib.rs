pub mod adapter;
pub mod aggregator;
pub mod config;
pub mod error;
pub mod input;
pub mod output;
pub mod pipeline;
pub mod reporter;
pub mod scap;
pub mod types;

#[cfg(test)]
pub mod test_utils;

pub use adapter::{AdapterRegistry, VerifyAdapter};
pub use aggregator::{CoverageReport, MergeOrchestrator};
pub use config::{Config, ConfigError};
pub use error::{ConsolidateError, Result};
pub use input::{FileSystemSource, InMemorySource, ReportSource, discover_reports};
pub use output::ReportWriter;
pub use pipeline::{ConsolidationPipeline, PipelineOutcome};
pub use reporter::{CoverageReporter, CsvReporter, JsonReporter, Reporter};
pub use scap::{
    CanonicalBenchmarkSelector, MappingManifestBuilder, ScapMappingManifest, apply_mapping_manifest,
};
pub use types::{
    ConsolidatedVerifyReport, ConsolidatedVerifyResult, NormalizedVerifyReport,
    NormalizedVerifyResult, Severity, VerifyStatus,
};
