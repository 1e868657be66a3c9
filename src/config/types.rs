//! Configuration type definitions.

use crate::types::{ToolPrecedence, ToolTier};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::error::ConfigError;
use super::severity::SeverityPolicy;

/// Main configuration structure for stig-consolidate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Merge orchestrator configuration.
    pub merge: MergeConfig,
    /// Severity inference from numeric weights.
    pub severity: SeverityPolicy,
    /// Canonical benchmark selection configuration.
    pub selector: SelectorConfig,
    /// Output artifact configuration.
    pub output: OutputConfig,
    /// Report file discovery configuration.
    pub discovery: DiscoveryConfig,
}

impl Config {
    /// Reject configurations that cannot produce a meaningful result.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let high = self.severity.high_weight_min;
        if !high.is_finite() {
            return Err(ConfigError::InvalidValue {
                field: "severity.high_weight_min".to_string(),
                message: format!("must be a finite number, got {high}"),
            });
        }
        if let Some(medium) = self.severity.medium_weight_min
            && !(medium.is_finite() && medium < high)
        {
            return Err(ConfigError::InvalidValue {
                field: "severity.medium_weight_min".to_string(),
                message: format!("must be below high_weight_min ({high}), got {medium}"),
            });
        }
        if self.discovery.extensions.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "discovery.extensions".to_string(),
                message: "at least one extension is required".to_string(),
            });
        }
        Ok(())
    }
}

/// Merge orchestrator configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Extra tool label to tier assignments, consulted before the built-in
    /// precedence table.
    ///
    /// ```yaml
    /// merge:
    ///   tool_tiers:
    ///     "ACAS": scap
    ///     "Internal Review": manual
    /// ```
    pub tool_tiers: IndexMap<String, ToolTier>,
}

impl MergeConfig {
    /// Precedence table with the configured tier overrides applied.
    pub fn precedence(&self) -> ToolPrecedence {
        ToolPrecedence::from_overrides(&self.tool_tiers)
    }
}

/// Canonical benchmark selector configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Vendor markers recognized in candidate names and source labels.
    pub vendor_markers: Vec<String>,
    /// Keywords flagging an enhanced/consolidated SCAP variant.
    pub enhanced_keywords: Vec<String>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            vendor_markers: [
                "disa",
                "microsoft",
                "red hat",
                "redhat",
                "canonical",
                "cisco",
                "oracle",
                "suse",
                "vmware",
                "apple",
                "google",
                "mozilla",
                "adobe",
                "ibm",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            enhanced_keywords: ["enhanced", "consolidated", "bundle"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Output artifact configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory the consolidated artifacts are written to.
    pub directory: PathBuf,
    /// Pretty-print JSON artifacts.
    pub pretty_json: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("consolidated"),
            pretty_json: true,
        }
    }
}

/// Report file discovery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// File extensions treated as candidate tool reports.
    pub extensions: Vec<String>,
    /// Maximum directory depth. None means unlimited.
    pub max_depth: Option<usize>,
    /// Whether to follow symbolic links.
    pub follow_symlinks: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["ckl".to_string(), "xml".to_string()],
            max_depth: None,
            follow_symlinks: false,
        }
    }
}
