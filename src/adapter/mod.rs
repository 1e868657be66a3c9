//! Format adapter layer.
//!
//! This module normalizes raw tool output into [`NormalizedVerifyReport`]s:
//! - Manual review checklists (CKL)
//! - Evaluate-STIG result XML
//! - SCAP / XCCDF `TestResult` XML (SCC and generic scanners)
//!
//! Each adapter implements the `VerifyAdapter` trait and feeds the merge
//! orchestrator in [`crate::aggregator`].

pub mod checklist;
pub mod evaluate_stig;
pub mod timestamp;
pub mod traits;
pub mod xccdf;
pub(crate) mod xml;

pub use checklist::ChecklistAdapter;
pub use evaluate_stig::EvaluateStigAdapter;
pub use timestamp::parse_timestamp;
pub use traits::VerifyAdapter;
pub use xccdf::XccdfAdapter;

use crate::config::SeverityPolicy;
use crate::types::NormalizedVerifyReport;

/// Registry of all available adapters.
pub struct AdapterRegistry {
    adapters: Vec<Box<dyn VerifyAdapter>>,
}

impl AdapterRegistry {
    /// Create a registry with the default adapters and severity policy.
    pub fn new() -> Self {
        Self::with_policy(SeverityPolicy::default())
    }

    /// Create a registry whose weight-based severity uses `policy`.
    pub fn with_policy(policy: SeverityPolicy) -> Self {
        Self {
            adapters: vec![
                Box::new(ChecklistAdapter::new()),
                Box::new(EvaluateStigAdapter::new()),
                Box::new(XccdfAdapter::new(policy)),
            ],
        }
    }

    /// Add an adapter. Adapters registered later are consulted last.
    pub fn register(&mut self, adapter: Box<dyn VerifyAdapter>) {
        self.adapters.push(adapter);
    }

    /// Find an adapter that understands the given report.
    pub fn find_adapter(&self, path: &str, content: &str) -> Option<&dyn VerifyAdapter> {
        self.adapters
            .iter()
            .find(|a| a.can_parse(path, content))
            .map(|a| a.as_ref())
    }

    /// Normalize content with the matching adapter, if any.
    pub fn parse(&self, content: &str, path: &str) -> Option<NormalizedVerifyReport> {
        self.find_adapter(path, content)
            .map(|adapter| adapter.parse_content(content, path))
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}
