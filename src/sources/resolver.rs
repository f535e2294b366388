//! Runtime version resolution.
//!
//! Maps requested CPython minor versions and target platforms onto concrete
//! python-build-standalone `install_only` archives from a single release.

use std::collections::BTreeSet;

use regex::Regex;

use crate::core::{MinorVersion, ResolvedVersions, RuntimeDescriptor, TargetPlatform};
use crate::sources::errors::ResolveError;
use crate::sources::source::{Release, ReleaseSource};

/// Number of minors selected when none are requested explicitly.
pub const DEFAULT_MINOR_COUNT: usize = 4;

/// Resolves runtime distributions against a release source.
pub struct VersionResolver<S> {
    source: S,
}

impl<S: ReleaseSource> VersionResolver<S> {
    pub fn new(source: S) -> Self {
        VersionResolver { source }
    }

    /// Fetch the latest release and resolve it.
    ///
    /// With no `requested` minors, the [`DEFAULT_MINOR_COUNT`] highest minors
    /// having at least one matching asset are selected.
    pub fn resolve(
        &self,
        requested: Option<&[MinorVersion]>,
        targets: &[TargetPlatform],
    ) -> Result<ResolvedVersions, ResolveError> {
        let release = self.source.latest_release()?;
        tracing::debug!(
            "Release {} from {} lists {} asset(s)",
            release.tag_name,
            self.source.location(),
            release.assets.len()
        );
        resolve_release(&release, requested, targets)
    }
}

/// Build the asset-name pattern for a set of targets.
///
/// Captures the minor version and the upstream platform triple.
fn asset_pattern(targets: &[TargetPlatform]) -> Result<Regex, ResolveError> {
    let triples: BTreeSet<&str> = targets.iter().map(|t| t.upstream_triple()).collect();
    let alternation = triples
        .into_iter()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("|");

    Ok(Regex::new(&format!(
        r"^cpython-3\.(\d+)\.\d+\+\d+-({})-install_only\.tar\.gz$",
        alternation
    ))?)
}

/// Resolve an already-fetched release.
pub fn resolve_release(
    release: &Release,
    requested: Option<&[MinorVersion]>,
    targets: &[TargetPlatform],
) -> Result<ResolvedVersions, ResolveError> {
    let mut found = ResolvedVersions::new();
    if targets.is_empty() {
        return Ok(found);
    }

    let pattern = asset_pattern(targets)?;

    for asset in &release.assets {
        let Some(caps) = pattern.captures(&asset.name) else {
            continue;
        };

        let Ok(minor) = caps[1].parse::<u32>() else {
            continue;
        };
        let triple = &caps[2];

        // Several targets never share a triple, but only requested ones count.
        for target in targets.iter().filter(|t| t.upstream_triple() == triple) {
            found.insert(RuntimeDescriptor {
                minor: MinorVersion::new(minor),
                target: *target,
                download_url: asset.browser_download_url.clone(),
                archive_name: asset.name.clone(),
                release_tag: release.tag_name.clone(),
            });
        }
    }

    let selected: BTreeSet<MinorVersion> = match requested {
        Some(minors) if !minors.is_empty() => minors.iter().copied().collect(),
        _ => {
            let available: Vec<MinorVersion> = found.minors().collect();
            let skip = available.len().saturating_sub(DEFAULT_MINOR_COUNT);
            available.into_iter().skip(skip).collect()
        }
    };

    for minor in found.minors() {
        if !selected.contains(&minor) {
            tracing::debug!("Dropping unselected Python 3.{}", minor);
        }
    }
    found.retain_minors(|m| selected.contains(&m));

    Ok(found)
}
