//! Implementation of `pookie versions` and the resolution step of `pookie run`.

use std::fmt::Write as _;

use anyhow::{Context, Result};

use crate::core::{MinorVersion, ResolvedVersions, TargetPlatform};
use crate::sources::{ReleaseSource, RemoteReleaseSource, VersionResolver, DEFAULT_RELEASE_URL};

/// Options for resolving runtime distributions.
#[derive(Debug, Clone, Default)]
pub struct VersionsOptions {
    /// Release metadata URL (None = upstream latest release)
    pub release_url: Option<String>,

    /// Requested minors (None = the newest available)
    pub python_versions: Option<Vec<MinorVersion>>,

    /// Targets to match assets for
    pub targets: Vec<TargetPlatform>,
}

impl VersionsOptions {
    pub fn release_url(&self) -> &str {
        self.release_url.as_deref().unwrap_or(DEFAULT_RELEASE_URL)
    }
}

/// Resolve runtime distributions from the configured release URL.
pub fn resolve_versions(opts: &VersionsOptions) -> Result<ResolvedVersions> {
    let source = RemoteReleaseSource::new(opts.release_url());
    resolve_versions_from(source, opts)
}

/// Resolve against an explicit release source.
pub fn resolve_versions_from<S: ReleaseSource>(
    source: S,
    opts: &VersionsOptions,
) -> Result<ResolvedVersions> {
    let location = source.location().to_string();
    let resolved = VersionResolver::new(source)
        .resolve(opts.python_versions.as_deref(), &opts.targets)
        .with_context(|| format!("failed to resolve Python versions from {}", location))?;

    tracing::debug!(
        "Resolved {} runtime(s) across {} minor version(s)",
        resolved.len(),
        resolved.minors().count()
    );
    Ok(resolved)
}

/// Human-readable listing of resolved runtimes, grouped by minor.
pub fn format_versions(resolved: &ResolvedVersions) -> String {
    let mut out = String::new();

    for (minor, targets) in resolved.iter() {
        let _ = writeln!(out, "Python {}.x:", minor.dotted());
        for (target, runtime) in targets {
            let _ = writeln!(out, "  Target: {}", target);
            let _ = writeln!(out, "    Filename: {}", runtime.archive_name);
            let _ = writeln!(out, "    Release tag: {}", runtime.release_tag);
            let _ = writeln!(out, "    Download URL: {}", runtime.download_url);
        }
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{asset, release_with, StaticReleaseSource};

    fn opts(minors: Option<Vec<u32>>) -> VersionsOptions {
        VersionsOptions {
            release_url: None,
            python_versions: minors.map(|m| m.into_iter().map(MinorVersion::new).collect()),
            targets: vec![TargetPlatform::ManylinuxX86_64, TargetPlatform::WinAmd64],
        }
    }

    #[test]
    fn test_default_release_url() {
        assert_eq!(opts(None).release_url(), DEFAULT_RELEASE_URL);
    }

    #[test]
    fn test_resolve_from_source() {
        let release = release_with(
            "20240713",
            vec![
                asset(11, TargetPlatform::ManylinuxX86_64),
                asset(12, TargetPlatform::ManylinuxX86_64),
                asset(12, TargetPlatform::WinAmd64),
            ],
        );

        let resolved =
            resolve_versions_from(StaticReleaseSource::new(release), &opts(Some(vec![12])))
                .unwrap();

        let minors: Vec<MinorVersion> = resolved.minors().collect();
        assert_eq!(minors, vec![MinorVersion::new(12)]);
        assert_eq!(resolved.len(), 2);
    }

    #[test]
    fn test_fetch_failure_has_context() {
        let err = resolve_versions_from(StaticReleaseSource::failing(503), &opts(None))
            .unwrap_err();
        let msg = format!("{:#}", err);
        assert!(msg.contains("failed to resolve Python versions from static"));
        assert!(msg.contains("503"));
    }

    #[test]
    fn test_format_versions() {
        let release = release_with("20240713", vec![asset(12, TargetPlatform::WinAmd64)]);
        let resolved =
            resolve_versions_from(StaticReleaseSource::new(release), &opts(None)).unwrap();

        assert_eq!(
            format_versions(&resolved),
            "Python 3.12.x:\n  \
             Target: win_amd64\n    \
             Filename: cpython-3.12.1+20240713-x86_64-pc-windows-msvc-install_only.tar.gz\n    \
             Release tag: 20240713\n    \
             Download URL: https://example.invalid/download/\
             cpython-3.12.1+20240713-x86_64-pc-windows-msvc-install_only.tar.gz\n\n"
        );
    }

    #[test]
    fn test_format_empty() {
        assert_eq!(format_versions(&ResolvedVersions::new()), "");
    }
}
