//! `V<major>R<minor>` benchmark version tokens.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static SHORT_FORM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|[^a-z0-9])v(\d+)\s*r(\d+)(?:[^0-9]|$)").expect("valid version regex")
});

static LONG_FORM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bversion\s*(\d+)[\s,:;-]*release\s*:?\s*(\d+)").expect("valid version regex")
});

/// Version and release of a benchmark, ordered version first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct BenchmarkVersion {
    pub version: u32,
    pub release: u32,
}

impl BenchmarkVersion {
    /// Version from its parts.
    pub fn new(version: u32, release: u32) -> Self {
        Self { version, release }
    }

    /// First version token in `name`: `V2R1`, `v2 r1` or
    /// `Version 2 Release 1`.
    pub fn parse(name: &str) -> Option<Self> {
        [&*SHORT_FORM, &*LONG_FORM].iter().find_map(|re| {
            let caps = re.captures(name)?;
            let version = caps.get(1)?.as_str().parse().ok()?;
            let release = caps.get(2)?.as_str().parse().ok()?;
            Some(Self { version, release })
        })
    }
}

impl std::fmt::Display for BenchmarkVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "V{}R{}", self.version, self.release)
    }
}
