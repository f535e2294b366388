//! Runtime versions and resolved distributions.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::target::{ParseSettingError, TargetPlatform};

/// A CPython 3.x minor version, e.g. `12` for Python 3.12.
///
/// Ordering is numeric, so `9 < 10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MinorVersion(u32);

impl MinorVersion {
    pub const fn new(minor: u32) -> Self {
        MinorVersion(minor)
    }

    pub const fn get(&self) -> u32 {
        self.0
    }

    /// ABI tag without the dot, e.g. `312`.
    pub fn nodot(&self) -> String {
        format!("3{}", self.0)
    }

    /// Dotted version, e.g. `3.12`.
    pub fn dotted(&self) -> String {
        format!("3.{}", self.0)
    }

    /// CPython ABI tag, e.g. `cp312`.
    pub fn cp_tag(&self) -> String {
        format!("cp3{}", self.0)
    }
}

impl fmt::Display for MinorVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MinorVersion {
    type Err = ParseSettingError;

    /// Accepts either the bare minor (`12`) or the dotted form (`3.12`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let minor = trimmed.strip_prefix("3.").unwrap_or(trimmed);
        minor
            .parse::<u32>()
            .map(MinorVersion)
            .map_err(|_| ParseSettingError {
                kind: "python version",
                value: s.to_string(),
                expected: "a CPython 3.x minor such as `12` or `3.12`".to_string(),
            })
    }
}

/// A downloadable runtime distribution for one `(minor, target)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeDescriptor {
    pub minor: MinorVersion,
    pub target: TargetPlatform,
    /// URL of the `install_only` archive.
    pub download_url: String,
    /// Asset filename, e.g. `cpython-3.12.4+20240713-x86_64-unknown-linux-gnu-install_only.tar.gz`.
    pub archive_name: String,
    /// Upstream release tag the asset belongs to.
    pub release_tag: String,
}

/// Resolution result: minor -> target -> descriptor.
///
/// Only combinations found upstream are present, and no minor maps to an
/// empty target map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResolvedVersions {
    entries: BTreeMap<MinorVersion, BTreeMap<TargetPlatform, RuntimeDescriptor>>,
}

impl ResolvedVersions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a descriptor, replacing any earlier one for the same pair.
    pub fn insert(&mut self, descriptor: RuntimeDescriptor) {
        self.entries
            .entry(descriptor.minor)
            .or_default()
            .insert(descriptor.target, descriptor);
    }

    /// Keep only the given minors.
    pub fn retain_minors(&mut self, keep: impl Fn(MinorVersion) -> bool) {
        self.entries.retain(|minor, _| keep(*minor));
    }

    pub fn get(&self, minor: MinorVersion, target: TargetPlatform) -> Option<&RuntimeDescriptor> {
        self.entries.get(&minor).and_then(|m| m.get(&target))
    }

    /// Minors in ascending numeric order.
    pub fn minors(&self) -> impl Iterator<Item = MinorVersion> + '_ {
        self.entries.keys().copied()
    }

    pub fn iter(
        &self,
    ) -> impl Iterator<Item = (&MinorVersion, &BTreeMap<TargetPlatform, RuntimeDescriptor>)> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
