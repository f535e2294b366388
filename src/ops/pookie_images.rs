//! Implementation of `pookie images`.
//!
//! Prepares every image chain a run would need without starting any
//! container.

use std::path::PathBuf;

use serde::Serialize;

use crate::builder::cache::{ImageLayerCache, LayerError};
use crate::builder::engine::ContainerEngine;
use crate::builder::events::MatrixEvent;
use crate::core::{MinorVersion, ResolvedVersions, TargetPlatform};
use crate::ops::pookie_run::matrix_pairs;
use crate::util::log::LogSink;

#[derive(Debug, Clone, Default)]
pub struct ImagesOptions {
    pub targets: Vec<TargetPlatform>,
    pub images_dir: PathBuf,
    pub context: PathBuf,
}

/// A pair whose environment could not be built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedEnvironment {
    pub target: TargetPlatform,
    pub python: MinorVersion,
    pub image: String,
    /// Exit status of the failed build; null when the engine itself errored
    pub code: Option<i32>,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImagesReport {
    /// Pairs whose full chain is available
    pub ready: usize,
    pub failed: Vec<FailedEnvironment>,
}

/// Ensure the image chain of every resolved pair. A pair that cannot be
/// prepared is recorded and the next pair is still attempted.
pub fn ensure_images<E: ContainerEngine + ?Sized>(
    engine: &E,
    resolved: &ResolvedVersions,
    opts: &ImagesOptions,
    log: &mut LogSink,
    on_event: &mut dyn FnMut(MatrixEvent),
) -> ImagesReport {
    let mut cache = ImageLayerCache::new(engine, &opts.images_dir, &opts.context);
    let mut report = ImagesReport::default();

    for runtime in matrix_pairs(&opts.targets, resolved) {
        match cache.ensure_chain(runtime.target, Some(runtime), log, on_event) {
            Ok(()) => report.ready += 1,
            Err(err) => {
                let code = match &err {
                    LayerError::BuildFailed { code, .. } => *code,
                    LayerError::Engine { .. } => {
                        tracing::warn!("{}", err);
                        None
                    }
                };
                report.failed.push(FailedEnvironment {
                    target: runtime.target,
                    python: runtime.minor,
                    image: err.image().to_string(),
                    code,
                    error: err.to_string(),
                });
            }
        }
    }

    report
}
