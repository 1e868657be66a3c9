//! SCAP benchmark attribution.
//!
//! Three stages run after the merge:
//! - [`CanonicalBenchmarkSelector`] picks one SCAP candidate for a guide
//! - [`MappingManifestBuilder`] maps the guide's controls to that candidate
//! - [`apply_mapping_manifest`] stamps the result onto a consolidated report

pub mod apply;
pub mod manifest;
pub mod selector;
pub mod types;
pub mod version;

pub use apply::{NOT_IN_MANIFEST, apply_mapping_manifest};
pub use manifest::{HeuristicProposal, MappingHeuristic, MappingManifestBuilder, NO_SCAP_MAPPING};
pub use selector::CanonicalBenchmarkSelector;
pub use types::{
    ControlRecord, GuideDescriptor, MappingMethod, ScapCandidate, ScapControlMapping,
    ScapMappingManifest, ScapSelectionResult, normalize_id,
};
pub use version::BenchmarkVersion;
