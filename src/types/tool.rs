//! Tool precedence tiers.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::status::normalize_token;

/// Canonical label the checklist adapter stamps on manual review results.
pub const MANUAL_TOOL: &str = "Manual";
/// Canonical label for the dedicated compliance scanner.
pub const SCC_TOOL: &str = "SCC";
/// Canonical label for the automated evaluator.
pub const EVALUATE_STIG_TOOL: &str = "Evaluate-STIG";
/// Canonical label for raw SCAP scans.
pub const SCAP_TOOL: &str = "SCAP";

/// Precedence tier of a tool, lowest first so the derived `Ord` ranks a
/// manual review above everything else.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ToolTier {
    #[default]
    Unrecognized,
    Scap,
    EvaluateStig,
    Scc,
    Manual,
}

impl ToolTier {
    /// Classify a free-form tool label with the built-in table.
    pub fn classify(label: &str) -> Self {
        let token = normalize_token(label);
        if token.is_empty() {
            return ToolTier::Unrecognized;
        }
        if token.contains("manual") || token == "ckl" || token == "checklist" {
            ToolTier::Manual
        } else if token.contains("evaluatestig") {
            ToolTier::EvaluateStig
        } else if token == "scc" || token.starts_with("sccscap") || token.starts_with("scc5") {
            ToolTier::Scc
        } else if token.contains("scap") || token.contains("xccdf") || token.contains("oscap") {
            ToolTier::Scap
        } else {
            ToolTier::Unrecognized
        }
    }

    /// Human-readable tier name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolTier::Unrecognized => "unrecognized",
            ToolTier::Scap => "scap",
            ToolTier::EvaluateStig => "evaluate_stig",
            ToolTier::Scc => "scc",
            ToolTier::Manual => "manual",
        }
    }

    /// Human-readable tier name used in conflict resolution reasons.
    pub fn description(&self) -> &'static str {
        match self {
            ToolTier::Unrecognized => "unrecognized tool",
            ToolTier::Scap => "raw SCAP scan",
            ToolTier::EvaluateStig => "automated evaluator",
            ToolTier::Scc => "dedicated compliance scanner",
            ToolTier::Manual => "manual review",
        }
    }
}

impl std::fmt::Display for ToolTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tool precedence table: the built-in classification plus configured
/// label overrides.
#[derive(Debug, Clone, Default)]
pub struct ToolPrecedence {
    overrides: IndexMap<String, ToolTier>,
}

impl ToolPrecedence {
    /// Built-in precedence table without overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a tier to a specific label, taking priority over the
    /// built-in table.
    pub fn with_override(mut self, label: &str, tier: ToolTier) -> Self {
        self.overrides.insert(normalize_token(label), tier);
        self
    }

    /// Built-in table extended with configured label → tier assignments.
    pub fn from_overrides<'a>(overrides: impl IntoIterator<Item = (&'a String, &'a ToolTier)>) -> Self {
        overrides
            .into_iter()
            .fold(Self::new(), |table, (label, tier)| {
                table.with_override(label, *tier)
            })
    }

    /// Tier for a tool label; unrecognized labels get the lowest tier.
    pub fn tier_of(&self, label: &str) -> ToolTier {
        self.overrides
            .get(&normalize_token(label))
            .copied()
            .unwrap_or_else(|| ToolTier::classify(label))
    }

    /// Total order over tool labels, highest precedence first. Labels in
    /// the same tier fall back to case-insensitive lexical order.
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        self.tier_of(b)
            .cmp(&self.tier_of(a))
            .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
            .then_with(|| a.cmp(b))
    }
}
