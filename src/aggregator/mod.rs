//! Aggregation layer.
//!
//! This module reconciles normalized reports into one consolidated record:
//! - Groups findings into controls with a union-find over identifiers
//! - De-duplicates per tool and resolves status by tool precedence
//! - Records conflicts and coalesces the remaining fields
//! - Derives status summaries and tool coverage views

pub mod coverage;
pub mod grouping;
pub mod merge;
pub mod summary;
pub mod union_find;

pub use coverage::{ControlSource, CoverageReport, OverlapRow, ToolCoverage};
pub use grouping::{Grouping, canonical_order, group_findings};
pub use merge::MergeOrchestrator;
pub use summary::{SeverityBreakdown, SummaryBuilder};
pub use union_find::UnionFind;
