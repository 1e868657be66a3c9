//! Control grouping across tools.
//!
//! Findings are the same control when they share an asset, carry
//! compatible benchmark ids and agree on the first identifier both of them
//! have (vuln id, else rule id, else title). Groups close transitively
//! through a [`UnionFind`], with two guards:
//!
//! - an unlabeled finding that directly matches findings carrying two or
//!   more distinct vuln ids is ambiguous and stays a singleton;
//! - a union that would put two distinct vuln ids, or two distinct
//!   benchmark ids, into one group is refused.
//!
//! Both cases are reported as diagnostics. The caller passes findings in a
//! canonical order so the outcome does not depend on input order.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use tracing::{debug, warn};

use super::union_find::UnionFind;
use crate::types::NormalizedVerifyResult;
use crate::types::status::normalize_token;

/// Case-insensitive identity of one finding.
#[derive(Debug, Clone, PartialEq, Eq)]
struct IdentityKey {
    asset: String,
    vuln: Option<String>,
    rule: Option<String>,
    title: String,
    benchmark: Option<String>,
}

fn lower(value: Option<&str>) -> Option<String> {
    value
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
}

impl IdentityKey {
    fn of(result: &NormalizedVerifyResult) -> Self {
        Self {
            asset: lower(result.asset_id.as_deref()).unwrap_or_default(),
            vuln: lower(result.vuln_id.as_deref()),
            rule: lower(result.rule_id.as_deref()),
            title: result.title.trim().to_lowercase(),
            benchmark: result
                .benchmark_id
                .as_deref()
                .map(normalize_token)
                .filter(|b| !b.is_empty()),
        }
    }

    fn matches(&self, other: &Self) -> bool {
        if self.asset != other.asset {
            return false;
        }
        if let (Some(a), Some(b)) = (&self.benchmark, &other.benchmark)
            && a != b
        {
            return false;
        }
        match (&self.vuln, &other.vuln, &self.rule, &other.rule) {
            (Some(a), Some(b), _, _) => a == b,
            (_, _, Some(a), Some(b)) => a == b,
            _ => !self.title.is_empty() && self.title == other.title,
        }
    }
}

/// Labels accumulated by one group, used to refuse unsafe unions.
#[derive(Debug, Clone, Default)]
struct GroupLabels {
    vulns: BTreeSet<String>,
    benchmarks: BTreeSet<String>,
}

impl GroupLabels {
    fn of(key: &IdentityKey) -> Self {
        Self {
            vulns: key.vuln.iter().cloned().collect(),
            benchmarks: key.benchmark.iter().cloned().collect(),
        }
    }

    fn compatible(&self, other: &Self) -> bool {
        self.vulns.union(&other.vulns).count() <= 1
            && self.benchmarks.union(&other.benchmarks).count() <= 1
    }

    fn absorb(&mut self, other: Self) {
        self.vulns.extend(other.vulns);
        self.benchmarks.extend(other.benchmarks);
    }
}

/// Outcome of grouping: member indices per control plus diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grouping {
    /// Indices into the input slice, ascending within each group; groups
    /// ordered by their smallest member.
    pub groups: Vec<Vec<usize>>,
    pub diagnostics: Vec<String>,
}

/// Canonical total order over findings.
pub fn canonical_order(a: &NormalizedVerifyResult, b: &NormalizedVerifyResult) -> Ordering {
    let key = |r: &NormalizedVerifyResult| {
        (
            r.control_key().to_lowercase(),
            lower(r.asset_id.as_deref()),
            r.tool.to_lowercase(),
            r.source_file.clone(),
        )
    };
    key(a)
        .cmp(&key(b))
        .then_with(|| a.verified_at.cmp(&b.verified_at))
        .then_with(|| a.status.cmp(&b.status))
        .then_with(|| a.vuln_id.cmp(&b.vuln_id))
        .then_with(|| a.rule_id.cmp(&b.rule_id))
        .then_with(|| a.title.cmp(&b.title))
        .then_with(|| a.asset_id.cmp(&b.asset_id))
        .then_with(|| a.benchmark_id.cmp(&b.benchmark_id))
        .then_with(|| a.tool.cmp(&b.tool))
        .then_with(|| a.severity.cmp(&b.severity))
        .then_with(|| a.comments.cmp(&b.comments))
        .then_with(|| a.evidence_paths.cmp(&b.evidence_paths))
        .then_with(|| a.metadata.iter().cmp(b.metadata.iter()))
}

fn describe(result: &NormalizedVerifyResult) -> String {
    format!(
        "'{}' from {} ({})",
        result.control_key(),
        result.tool,
        result.source_file
    )
}

/// Group findings into controls. `findings` should already be sorted with
/// [`canonical_order`].
pub fn group_findings(findings: &[&NormalizedVerifyResult]) -> Grouping {
    let keys: Vec<IdentityKey> = findings.iter().map(|f| IdentityKey::of(f)).collect();

    let mut buckets: HashMap<(u8, &str, &str), Vec<usize>> = HashMap::new();
    for (i, key) in keys.iter().enumerate() {
        if let Some(vuln) = &key.vuln {
            buckets.entry((0, &key.asset, vuln)).or_default().push(i);
        }
        if let Some(rule) = &key.rule {
            buckets.entry((1, &key.asset, rule)).or_default().push(i);
        }
        if !key.title.is_empty() {
            buckets.entry((2, &key.asset, &key.title)).or_default().push(i);
        }
    }

    // Direct matches, each pair once, lower index first.
    let mut neighbours: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); keys.len()];
    for members in buckets.values() {
        for (pos, &i) in members.iter().enumerate() {
            for &j in &members[pos + 1..] {
                if keys[i].matches(&keys[j]) {
                    neighbours[i].insert(j);
                    neighbours[j].insert(i);
                }
            }
        }
    }

    let mut diagnostics = BTreeSet::new();
    let ambiguous: Vec<bool> = keys
        .iter()
        .enumerate()
        .map(|(i, key)| {
            if key.vuln.is_some() {
                return false;
            }
            let vulns: BTreeSet<&str> = neighbours[i]
                .iter()
                .filter_map(|&j| findings[j].vuln_id.as_deref())
                .collect();
            let distinct: BTreeSet<String> = vulns.iter().map(|v| v.to_lowercase()).collect();
            if distinct.len() < 2 {
                return false;
            }
            let listed: Vec<&str> = vulns.into_iter().collect();
            diagnostics.insert(format!(
                "Ambiguous control match: finding {} matches distinct vuln ids [{}]; kept as a separate control",
                describe(findings[i]),
                listed.join(", ")
            ));
            true
        })
        .collect();

    let mut uf = UnionFind::new(keys.len());
    let mut labels: Vec<GroupLabels> = keys.iter().map(GroupLabels::of).collect();
    for i in 0..keys.len() {
        if ambiguous[i] {
            continue;
        }
        for &j in neighbours[i].iter().filter(|&&j| j > i) {
            if ambiguous[j] {
                continue;
            }
            let (ri, rj) = (uf.find(i), uf.find(j));
            if ri == rj {
                continue;
            }
            if !labels[ri].compatible(&labels[rj]) {
                diagnostics.insert(format!(
                    "Refused to group finding {} with {}: conflicting vuln or benchmark ids",
                    describe(findings[i]),
                    describe(findings[j])
                ));
                continue;
            }
            if let Some((root, absorbed)) = uf.union(ri, rj) {
                let taken = std::mem::take(&mut labels[absorbed]);
                labels[root].absorb(taken);
            }
        }
    }

    let groups = uf.sets();
    for message in &diagnostics {
        warn!(message = %message, "Grouping ambiguity");
    }
    debug!(
        findings = findings.len(),
        groups = groups.len(),
        "Grouped findings into controls"
    );
    Grouping {
        groups,
        diagnostics: diagnostics.into_iter().collect(),
    }
}
