//! Output layer.
//!
//! Renders a consolidated report with the [`crate::reporter`] types and
//! writes the resulting artifact set to an output directory.

pub mod writer;

pub use writer::{
    CONSOLIDATED_CSV, CONSOLIDATED_JSON, CONTROL_SOURCES_CSV, COVERAGE_OVERLAP_CSV,
    COVERAGE_OVERLAP_JSON, MAPPING_MANIFEST_JSON, ReportWriter, TOOL_COVERAGE_CSV,
    TOOL_COVERAGE_JSON, WrittenArtifacts,
};
