//! Severity inference policy.

use serde::{Deserialize, Serialize};

/// Policy for deriving a severity from a numeric XCCDF weight.
///
/// Example:
/// ```yaml
/// severity:
///   high_weight_min: 10.0
///   medium_weight_min: 5.0   # optional; without it everything below high is low
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityPolicy {
    /// Weights at or above this value are high.
    pub high_weight_min: f64,
    /// Weights at or above this value (and below `high_weight_min`) are
    /// medium. When unset there is no medium band.
    pub medium_weight_min: Option<f64>,
}

impl Default for SeverityPolicy {
    fn default() -> Self {
        Self {
            high_weight_min: 10.0,
            medium_weight_min: None,
        }
    }
}
