//! Input layer: how raw tool reports reach the adapters.
//!
//! This module handles:
//! - The synchronous `ReportSource` read abstraction (file system or in-memory)
//! - Discovery of candidate report files under a results directory

pub mod discovery;
pub mod source;

pub use discovery::{DiscoveredReports, discover_reports, scan_reports};
pub use source::{FileSystemSource, InMemorySource, ReportSource};
