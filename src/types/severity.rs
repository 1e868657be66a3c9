use crate::config::SeverityPolicy;
use serde::{Deserialize, Serialize};

use super::status::normalize_token;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Unknown,
    Low,
    Medium,
    High,
}

impl Severity {
    /// Parse a severity label. Accepts the plain labels and the DISA
    /// category spellings (`CAT I` is high, `CAT III` is low).
    pub fn from_token(raw: &str) -> Self {
        match normalize_token(raw).as_str() {
            "high" | "cati" | "cat1" | "critical" => Severity::High,
            "medium" | "moderate" | "catii" | "cat2" => Severity::Medium,
            "low" | "catiii" | "cat3" => Severity::Low,
            _ => Severity::Unknown,
        }
    }

    /// Derive a severity from a numeric XCCDF weight.
    pub fn from_weight(weight: f64, policy: &SeverityPolicy) -> Self {
        if weight >= policy.high_weight_min {
            return Severity::High;
        }
        match policy.medium_weight_min {
            Some(medium) if weight >= medium => Severity::Medium,
            _ => Severity::Low,
        }
    }

    /// Anything but `Unknown`.
    pub fn is_known(&self) -> bool {
        *self != Severity::Unknown
    }

    /// Lowercase label used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Unknown => "unknown",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
