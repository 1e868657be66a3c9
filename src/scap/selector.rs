//! Canonical benchmark selection.
//!
//! Picks at most one SCAP candidate per guide. Each stage keeps only a
//! strict, non-empty subset of the remaining candidates and selection stops
//! as soon as one candidate is left:
//!
//! 1. version alignment (`V<major>R<minor>`)
//! 2. benchmark-id overlap
//! 3. vendor-enhanced preference
//! 4. deterministic fallback ordering

use std::cmp::Ordering;
use std::collections::BTreeSet;

use tracing::debug;

use super::types::{GuideDescriptor, ScapCandidate, ScapSelectionResult, normalize_id};
use super::version::BenchmarkVersion;
use crate::config::SelectorConfig;

/// Selects the canonical SCAP benchmark for a guide.
#[derive(Debug, Clone)]
pub struct CanonicalBenchmarkSelector {
    /// Lowercase word sequences; a marker matches only on word boundaries.
    vendor_markers: Vec<Vec<String>>,
    enhanced_keywords: Vec<Vec<String>>,
}

impl Default for CanonicalBenchmarkSelector {
    fn default() -> Self {
        Self::from_config(&SelectorConfig::default())
    }
}

impl CanonicalBenchmarkSelector {
    /// Selector with the default vendor markers and enhanced keywords.
    pub fn new() -> Self {
        Self::default()
    }

    /// Selector using the configured marker and keyword lists.
    pub fn from_config(config: &SelectorConfig) -> Self {
        let phrases = |values: &[String]| -> Vec<Vec<String>> {
            values.iter().map(|v| words(v)).filter(|w| !w.is_empty()).collect()
        };
        Self {
            vendor_markers: phrases(&config.vendor_markers),
            enhanced_keywords: phrases(&config.enhanced_keywords),
        }
    }

    /// Run the selection stages over `candidates` for `guide`.
    pub fn select(&self, guide: &GuideDescriptor, candidates: &[ScapCandidate]) -> ScapSelectionResult {
        let initial = candidates.len();
        let mut pool: Vec<&ScapCandidate> = candidates.iter().collect();
        let mut reasons = Vec::new();

        if pool.len() > 1 {
            self.align_version(guide, &mut pool, &mut reasons);
        }
        if pool.len() > 1 {
            self.prefer_overlap(guide, &mut pool, &mut reasons);
        }
        if pool.len() > 1 {
            self.prefer_vendor_enhanced(&mut pool, &mut reasons);
        }
        if pool.len() > 1 {
            pool.sort_by(|a, b| fallback_order(a, b));
            reasons.push(format!(
                "Deterministic fallback: chose '{}' ({}) from {} candidates by release date, import time, name and pack id",
                pool[0].name,
                pool[0].pack_id,
                pool.len()
            ));
            pool.truncate(1);
        }

        let winner = pool.first().map(|c| (*c).clone());
        debug!(
            guide = %guide.name,
            candidates = initial,
            winner = ?winner.as_ref().map(|w| &w.pack_id),
            "Benchmark selection finished"
        );
        ScapSelectionResult {
            winner,
            reasons,
            has_conflict: initial > 1,
        }
    }

    fn align_version(
        &self,
        guide: &GuideDescriptor,
        pool: &mut Vec<&ScapCandidate>,
        reasons: &mut Vec<String>,
    ) {
        let Some(version) = BenchmarkVersion::parse(&guide.name) else {
            return;
        };
        let before = pool.len();
        if narrow(pool, |c| BenchmarkVersion::parse(&c.name) == Some(version)) {
            debug!(%version, kept = pool.len(), "Version alignment narrowed candidates");
            reasons.push(format!(
                "Version alignment: kept {} of {} candidates matching {}",
                pool.len(),
                before,
                version
            ));
        }
    }

    fn prefer_overlap(
        &self,
        guide: &GuideDescriptor,
        pool: &mut Vec<&ScapCandidate>,
        reasons: &mut Vec<String>,
    ) {
        let wanted: BTreeSet<String> = guide
            .benchmark_ids
            .iter()
            .map(|id| normalize_id(id))
            .filter(|id| !id.is_empty())
            .collect();
        let overlap = |c: &ScapCandidate| {
            c.benchmark_ids
                .iter()
                .map(|id| normalize_id(id))
                .collect::<BTreeSet<_>>()
                .intersection(&wanted)
                .count()
        };
        let max = pool.iter().map(|c| overlap(*c)).max().unwrap_or(0);
        if max == 0 {
            return;
        }
        let before = pool.len();
        if narrow(pool, |c| overlap(c) == max) {
            debug!(max, kept = pool.len(), "Benchmark-id overlap narrowed candidates");
            reasons.push(format!(
                "Benchmark-id overlap: kept {} of {} candidates sharing {} benchmark id(s) with the guide",
                pool.len(),
                before,
                max
            ));
        }
    }

    fn prefer_vendor_enhanced(&self, pool: &mut Vec<&ScapCandidate>, reasons: &mut Vec<String>) {
        let before = pool.len();
        if narrow(pool, |c| self.is_vendor_enhanced(c)) {
            debug!(kept = pool.len(), "Vendor-enhanced preference narrowed candidates");
            reasons.push(format!(
                "Vendor-enhanced preference: kept {} of {} candidates labeled as vendor-enhanced SCAP content",
                pool.len(),
                before
            ));
        }
    }

    /// Name and source label together carry a vendor marker, an
    /// enhanced/consolidated/bundle keyword and the word `scap`.
    pub fn is_vendor_enhanced(&self, candidate: &ScapCandidate) -> bool {
        let text = words(&format!("{} {}", candidate.name, candidate.source_label));
        text.iter().any(|w| w == "scap")
            && self.vendor_markers.iter().any(|m| contains_phrase(&text, m))
            && self.enhanced_keywords.iter().any(|k| contains_phrase(&text, k))
    }
}

/// Lowercase alphanumeric words of `text`.
fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn contains_phrase(text: &[String], phrase: &[String]) -> bool {
    !phrase.is_empty() && text.windows(phrase.len()).any(|w| w == phrase)
}

/// Keep the candidates matching `keep` if they form a strict, non-empty
/// subset. Returns whether the pool changed.
fn narrow(pool: &mut Vec<&ScapCandidate>, keep: impl Fn(&ScapCandidate) -> bool) -> bool {
    let kept = pool.iter().filter(|c| keep(**c)).count();
    if kept == 0 || kept == pool.len() {
        return false;
    }
    pool.retain(|c| keep(*c));
    true
}

/// Release date desc (missing last), import time desc, name asc, pack id asc.
fn fallback_order(a: &ScapCandidate, b: &ScapCandidate) -> Ordering {
    let release = match (a.release_date, b.release_date) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    release
        .then_with(|| b.imported_at.cmp(&a.imported_at))
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.pack_id.cmp(&b.pack_id))
        .then_with(|| a.source_label.cmp(&b.source_label))
        .then_with(|| a.benchmark_ids.cmp(&b.benchmark_ids))
}
