//! Test utilities and mocks for pookie unit tests.
//!
//! This module provides a recording container engine and release fixtures
//! so the cache, runner and orchestrator can be tested without docker or
//! network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use pookie::test_support::{MockEngine, StaticReleaseSource};
//!
//! #[test]
//! fn test_example() {
//!     let engine = MockEngine::new().with_image("manylinux-lvl1-base");
//!     let source = StaticReleaseSource::new(release_with("v1", vec![]));
//!
//!     // Use mocks in tests...
//! }
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use anyhow::{bail, Result};

use crate::builder::engine::{ContainerEngine, ImageBuild, OutputSink, RunRequest, RunStatus};
use crate::core::{MinorVersion, RuntimeDescriptor, TargetPlatform};
use crate::sources::{Asset, Release, ReleaseSource, ResolveError};
use crate::util::log::LogSink;

/// One call made against a [`MockEngine`], in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    ImageExists(String),
    Build(ImageBuild),
    Run(RunRequest, OutputSink),
}

#[derive(Debug, Default)]
struct MockEngineState {
    images: HashSet<String>,
    build_status: HashMap<String, RunStatus>,
    run_status: HashMap<String, RunStatus>,
    broken: HashSet<String>,
    run_errors: HashSet<String>,
    unavailable: bool,
    calls: Vec<EngineCall>,
}

/// Mock container engine for testing image and container handling.
///
/// Records every call. Successful builds register the image, so later
/// existence checks see it exactly like docker would.
#[derive(Debug, Default)]
pub struct MockEngine {
    state: Mutex<MockEngineState>,
}

impl MockEngine {
    /// Create a mock engine with no images.
    pub fn new() -> Self {
        MockEngine::default()
    }

    /// Pretend an image already exists.
    pub fn with_image(self, name: &str) -> Self {
        self.state().images.insert(name.to_string());
        self
    }

    /// Make builds of `name` end with `status`.
    pub fn with_build_status(self, name: &str, status: RunStatus) -> Self {
        self.state()
            .build_status
            .insert(name.to_string(), status);
        self
    }

    /// Make containers started from `image` end with `status`.
    pub fn with_run_status(self, image: &str, status: RunStatus) -> Self {
        self.state().run_status.insert(image.to_string(), status);
        self
    }

    /// Make existence checks of `image` fail, the way a docker daemon
    /// error would.
    pub fn with_engine_error(self, image: &str) -> Self {
        self.state().broken.insert(image.to_string());
        self
    }

    /// Make containers from `image` fail to start.
    pub fn with_run_error(self, image: &str) -> Self {
        self.state().run_errors.insert(image.to_string());
        self
    }

    /// Make every call fail as if docker could not be started.
    pub fn unavailable(self) -> Self {
        self.state().unavailable = true;
        self
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockEngineState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// All calls, in order.
    pub fn calls(&self) -> Vec<EngineCall> {
        self.state().calls.clone()
    }

    /// Names of attempted image builds, in order.
    pub fn builds(&self) -> Vec<String> {
        self.build_requests().into_iter().map(|b| b.name).collect()
    }

    pub fn build_requests(&self) -> Vec<ImageBuild> {
        self.state()
            .calls
            .iter()
            .filter_map(|c| match c {
                EngineCall::Build(b) => Some(b.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn run_requests(&self) -> Vec<(RunRequest, OutputSink)> {
        self.state()
            .calls
            .iter()
            .filter_map(|c| match c {
                EngineCall::Run(r, o) => Some((r.clone(), *o)),
                _ => None,
            })
            .collect()
    }

    /// Whether the image exists now.
    pub fn has_image(&self, name: &str) -> bool {
        self.state().images.contains(name)
    }
}

impl ContainerEngine for MockEngine {
    fn image_exists(&self, name: &str) -> Result<bool> {
        let mut state = self.state();
        state.calls.push(EngineCall::ImageExists(name.to_string()));
        if state.unavailable {
            bail!("failed to execute `docker`: No such file or directory");
        }
        if state.broken.contains(name) {
            bail!("`docker images` failed for {}: daemon error", name);
        }
        Ok(state.images.contains(name))
    }

    fn build_image(&self, build: &ImageBuild, _log: &mut LogSink) -> Result<RunStatus> {
        let mut state = self.state();
        state.calls.push(EngineCall::Build(build.clone()));
        if state.unavailable {
            bail!("failed to execute `docker`: No such file or directory");
        }

        let status = state
            .build_status
            .get(&build.name)
            .copied()
            .unwrap_or_else(RunStatus::success);
        if status.is_success() {
            state.images.insert(build.name.clone());
        }
        Ok(status)
    }

    fn run(
        &self,
        request: &RunRequest,
        output: OutputSink,
        _log: &mut LogSink,
    ) -> Result<RunStatus> {
        let mut state = self.state();
        state.calls.push(EngineCall::Run(request.clone(), output));
        if state.unavailable {
            bail!("failed to execute `docker`: No such file or directory");
        }
        if state.run_errors.contains(&request.image) {
            bail!("`docker run` failed for {}: daemon error", request.image);
        }

        Ok(state
            .run_status
            .get(&request.image)
            .copied()
            .unwrap_or_else(RunStatus::success))
    }
}

/// Release source serving a fixed release, or a fixed HTTP failure.
#[derive(Debug, Clone)]
pub struct StaticReleaseSource {
    result: std::result::Result<Release, u16>,
}

impl StaticReleaseSource {
    pub fn new(release: Release) -> Self {
        StaticReleaseSource {
            result: Ok(release),
        }
    }

    /// Every fetch fails with this HTTP status.
    pub fn failing(status: u16) -> Self {
        StaticReleaseSource {
            result: Err(status),
        }
    }
}

impl ReleaseSource for StaticReleaseSource {
    fn location(&self) -> &str {
        "static"
    }

    fn latest_release(&self) -> std::result::Result<Release, ResolveError> {
        match &self.result {
            Ok(release) => Ok(release.clone()),
            Err(status) => Err(ResolveError::Status {
                url: self.location().to_string(),
                status: *status,
            }),
        }
    }
}

/// An `install_only` asset for one minor and target, as upstream names it.
pub fn asset(minor: u32, target: TargetPlatform) -> Asset {
    let name = format!(
        "cpython-3.{}.1+20240713-{}-install_only.tar.gz",
        minor,
        target.upstream_triple()
    );
    Asset {
        browser_download_url: format!("https://example.invalid/download/{}", name),
        name,
    }
}

pub fn release_with(tag: &str, assets: Vec<Asset>) -> Release {
    Release {
        tag_name: tag.to_string(),
        assets,
    }
}

/// A resolved descriptor without going through a release.
pub fn descriptor(minor: u32, target: TargetPlatform) -> RuntimeDescriptor {
    let asset = asset(minor, target);
    RuntimeDescriptor {
        minor: MinorVersion::new(minor),
        target,
        download_url: asset.browser_download_url,
        archive_name: asset.name,
        release_tag: "20240713".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_engine_registers_successful_builds() {
        let engine = MockEngine::new().with_build_status("bad", RunStatus::exited(1));
        let mut log = LogSink::memory();

        let good = ImageBuild {
            name: "good".to_string(),
            dockerfile: "Dockerfile.good".into(),
            context: ".".into(),
            build_args: vec![],
        };
        let bad = ImageBuild {
            name: "bad".to_string(),
            ..good.clone()
        };

        assert!(engine.build_image(&good, &mut log).unwrap().is_success());
        assert!(!engine.build_image(&bad, &mut log).unwrap().is_success());
        assert!(engine.has_image("good"));
        assert!(!engine.has_image("bad"));
        assert_eq!(engine.builds(), vec!["good", "bad"]);
    }

    #[test]
    fn test_unavailable_engine_errors() {
        let engine = MockEngine::new().unavailable();
        assert!(engine.image_exists("x").is_err());
        assert_eq!(engine.calls(), vec![EngineCall::ImageExists("x".to_string())]);
    }

    #[test]
    fn test_asset_matches_upstream_naming() {
        let a = asset(12, TargetPlatform::MacosArm64);
        assert_eq!(
            a.name,
            "cpython-3.12.1+20240713-aarch64-apple-darwin-install_only.tar.gz"
        );
    }
}
