//! Core data model shared by adapters, the merge orchestrator and the SCAP
//! mapping stages.

pub mod consolidated;
pub mod severity;
pub mod status;
pub mod tool;
pub mod verify;

pub use consolidated::{
    ConflictRecord, ConsolidatedVerifyReport, ConsolidatedVerifyResult, MAPPING_STATUS_KEY,
    ResultSource, SourceReportSummary, StatusSummary,
};
pub use severity::Severity;
pub use status::VerifyStatus;
pub use tool::{
    EVALUATE_STIG_TOOL, MANUAL_TOOL, SCAP_TOOL, SCC_TOOL, ToolPrecedence, ToolTier,
};
pub use verify::{Metadata, NormalizedVerifyReport, NormalizedVerifyResult};
