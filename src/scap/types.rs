//! Benchmark attribution data model.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::status::normalize_token;

/// Case and punctuation-insensitive identifier used for benchmark, vuln and
/// rule comparisons.
pub fn normalize_id(raw: &str) -> String {
    normalize_token(raw)
}

/// The guide (STIG) being attributed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideDescriptor {
    pub pack_id: String,
    pub name: String,
    pub imported_at: DateTime<Utc>,
    #[serde(default)]
    pub benchmark_ids: BTreeSet<String>,
}

impl GuideDescriptor {
    /// Guide with no benchmark ids yet.
    pub fn new(pack_id: impl Into<String>, name: impl Into<String>, imported_at: DateTime<Utc>) -> Self {
        Self {
            pack_id: pack_id.into(),
            name: name.into(),
            imported_at,
            benchmark_ids: BTreeSet::new(),
        }
    }

    /// Add a benchmark id the guide covers.
    pub fn with_benchmark_id(mut self, id: impl Into<String>) -> Self {
        self.benchmark_ids.insert(id.into());
        self
    }
}

/// An imported SCAP package that may carry the guide's benchmark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScapCandidate {
    pub pack_id: String,
    pub name: String,
    #[serde(default)]
    pub source_label: String,
    pub imported_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<NaiveDate>,
    #[serde(default)]
    pub benchmark_ids: BTreeSet<String>,
}

impl ScapCandidate {
    /// Candidate with no source label, release date or benchmark ids.
    pub fn new(pack_id: impl Into<String>, name: impl Into<String>, imported_at: DateTime<Utc>) -> Self {
        Self {
            pack_id: pack_id.into(),
            name: name.into(),
            source_label: String::new(),
            imported_at,
            release_date: None,
            benchmark_ids: BTreeSet::new(),
        }
    }

    /// Set the label of the bundle the package was imported from.
    pub fn with_source_label(mut self, label: impl Into<String>) -> Self {
        self.source_label = label.into();
        self
    }

    /// Set the publisher's release date.
    pub fn with_release_date(mut self, date: NaiveDate) -> Self {
        self.release_date = Some(date);
        self
    }

    /// Add a benchmark id the package carries.
    pub fn with_benchmark_id(mut self, id: impl Into<String>) -> Self {
        self.benchmark_ids.insert(id.into());
        self
    }

    /// The candidate's own spelling of a benchmark id matching `id` after
    /// normalization.
    pub fn benchmark_matching(&self, id: &str) -> Option<&str> {
        let wanted = normalize_id(id);
        if wanted.is_empty() {
            return None;
        }
        self.benchmark_ids
            .iter()
            .find(|own| normalize_id(own) == wanted)
            .map(String::as_str)
    }
}

/// Outcome of canonical benchmark selection for one guide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScapSelectionResult {
    pub winner: Option<ScapCandidate>,
    /// One entry per stage that narrowed the candidate set.
    pub reasons: Vec<String>,
    /// More than one candidate existed initially.
    pub has_conflict: bool,
}

/// One control of the guide's catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vuln_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benchmark_id: Option<String>,
}

impl ControlRecord {
    /// Catalog control titled `title`.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            vuln_id: None,
            rule_id: None,
            title: title.into(),
            benchmark_id: None,
        }
    }

    /// Set the vulnerability id.
    pub fn with_vuln_id(mut self, id: impl Into<String>) -> Self {
        self.vuln_id = Some(id.into());
        self
    }

    /// Set the rule id.
    pub fn with_rule_id(mut self, id: impl Into<String>) -> Self {
        self.rule_id = Some(id.into());
        self
    }

    /// Set the benchmark the control belongs to.
    pub fn with_benchmark_id(mut self, id: impl Into<String>) -> Self {
        self.benchmark_id = Some(id.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MappingMethod {
    BenchmarkOverlap,
    StrictTagMatch,
    Unmapped,
}

impl MappingMethod {
    /// Label used for `mapping_status` and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            MappingMethod::BenchmarkOverlap => "BenchmarkOverlap",
            MappingMethod::StrictTagMatch => "StrictTagMatch",
            MappingMethod::Unmapped => "Unmapped",
        }
    }
}

impl std::fmt::Display for MappingMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Attribution of one control to the selected benchmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScapControlMapping {
    pub vuln_id: Option<String>,
    pub rule_id: Option<String>,
    pub benchmark_id: Option<String>,
    pub method: MappingMethod,
    pub confidence: f64,
    pub reason: Option<String>,
}

impl ScapControlMapping {
    /// Normalized `(vuln_id, rule_id)` lookup key.
    pub fn key(&self) -> (String, String) {
        control_key(self.vuln_id.as_deref(), self.rule_id.as_deref())
    }

    /// Value written to a result's `mapping_status` metadata.
    pub fn status_label(&self) -> &str {
        self.reason.as_deref().unwrap_or(self.method.as_str())
    }
}

pub(crate) fn control_key(vuln_id: Option<&str>, rule_id: Option<&str>) -> (String, String) {
    (
        vuln_id.map(normalize_id).unwrap_or_default(),
        rule_id.map(normalize_id).unwrap_or_default(),
    )
}

/// Hand-off from the mapping builder to manifest application.
///
/// Serializes with keys in field order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScapMappingManifest {
    pub stig_pack_id: String,
    pub stig_name: String,
    pub selected_benchmark_pack_id: Option<String>,
    pub selected_benchmark_name: Option<String>,
    pub control_mappings: Vec<ScapControlMapping>,
    pub unmapped_count: usize,
}

impl ScapMappingManifest {
    /// Manifest for `guide`, counting unmapped controls.
    pub fn new(
        guide: &GuideDescriptor,
        winner: Option<&ScapCandidate>,
        control_mappings: Vec<ScapControlMapping>,
    ) -> Self {
        let unmapped_count = count_unmapped(&control_mappings);
        Self {
            stig_pack_id: guide.pack_id.clone(),
            stig_name: guide.name.clone(),
            selected_benchmark_pack_id: winner.map(|w| w.pack_id.clone()),
            selected_benchmark_name: winner.map(|w| w.name.clone()),
            control_mappings,
            unmapped_count,
        }
    }

    /// Mapping for a control, by normalized `(vuln_id, rule_id)`.
    ///
    /// Scans the mappings; use [`index`](Self::index) for repeated lookups.
    pub fn lookup(&self, vuln_id: Option<&str>, rule_id: Option<&str>) -> Option<&ScapControlMapping> {
        let key = control_key(vuln_id, rule_id);
        self.control_mappings.iter().find(|m| m.key() == key)
    }

    /// Mappings keyed by normalized `(vuln_id, rule_id)`. The first mapping
    /// for a key wins, as with [`lookup`](Self::lookup).
    pub fn index(&self) -> HashMap<(String, String), &ScapControlMapping> {
        let mut index = HashMap::with_capacity(self.control_mappings.len());
        for mapping in &self.control_mappings {
            index.entry(mapping.key()).or_insert(mapping);
        }
        index
    }

    /// Mappings that attribute a benchmark.
    pub fn mapped_count(&self) -> usize {
        self.control_mappings
            .iter()
            .filter(|m| m.method != MappingMethod::Unmapped)
            .count()
    }

    /// Serialize with keys in field order.
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }

    /// Parse a persisted manifest. `unmapped_count` is recomputed from the
    /// mappings.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut manifest: Self = serde_json::from_str(json)?;
        manifest.unmapped_count = count_unmapped(&manifest.control_mappings);
        Ok(manifest)
    }
}

fn count_unmapped(mappings: &[ScapControlMapping]) -> usize {
    mappings
        .iter()
        .filter(|m| m.method == MappingMethod::Unmapped)
        .count()
}
