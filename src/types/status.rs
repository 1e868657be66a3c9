//! Canonical verification status vocabulary.

use serde::{Deserialize, Serialize};

/// Canonical status every tool vocabulary maps into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VerifyStatus {
    Pass,
    Fail,
    NotApplicable,
    NotReviewed,
    Unknown,
}

impl VerifyStatus {
    pub const ALL: [VerifyStatus; 5] = [
        VerifyStatus::Pass,
        VerifyStatus::Fail,
        VerifyStatus::NotApplicable,
        VerifyStatus::NotReviewed,
        VerifyStatus::Unknown,
    ];

    /// Map a raw tool token onto the canonical vocabulary.
    ///
    /// Matching ignores case, whitespace and punctuation, so `Not_Reviewed`,
    /// `not reviewed` and `NOTREVIEWED` are the same token. Unrecognized
    /// tokens become [`VerifyStatus::Unknown`].
    pub fn from_token(raw: &str) -> Self {
        match normalize_token(raw).as_str() {
            "pass" | "notafinding" | "compliant" | "closed" => Self::Pass,
            "open" | "fail" | "noncompliant" => Self::Fail,
            "notapplicable" | "na" => Self::NotApplicable,
            "notreviewed" | "notselected" => Self::NotReviewed,
            _ => Self::Unknown,
        }
    }

    /// Canonical label used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            VerifyStatus::Pass => "Pass",
            VerifyStatus::Fail => "Fail",
            VerifyStatus::NotApplicable => "NotApplicable",
            VerifyStatus::NotReviewed => "NotReviewed",
            VerifyStatus::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for VerifyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lowercase ASCII alphanumerics only.
pub(crate) fn normalize_token(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
