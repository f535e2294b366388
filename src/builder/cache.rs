//! Memoized image layer builds.
//!
//! The cache never keeps its own record of successful builds: the engine's
//! existence check is the source of truth, so a layer shared by several
//! targets is built once and found on every later request. Only failures
//! are remembered, so a broken layer is not rebuilt for every pair that
//! depends on it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use thiserror::Error;

use crate::builder::engine::{ContainerEngine, ImageBuild};
use crate::builder::events::MatrixEvent;
use crate::builder::image::ImageLayer;
use crate::core::{RuntimeDescriptor, TargetPlatform};
use crate::util::log::LogSink;

/// What `ensure_layer` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerStatus {
    /// The image already existed.
    Cached,
    /// The image was built by this call.
    Built,
}

#[derive(Debug, Error)]
pub enum LayerError {
    #[error("failed to build image `{image}` ({})", describe_code(.code))]
    BuildFailed { image: String, code: Option<i32> },

    #[error("container engine failed while preparing image `{image}`: {message}")]
    Engine { image: String, message: String },
}

impl LayerError {
    /// Name of the image that could not be prepared.
    pub fn image(&self) -> &str {
        match self {
            LayerError::BuildFailed { image, .. } | LayerError::Engine { image, .. } => image,
        }
    }
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit status {}", code),
        None => "terminated by signal".to_string(),
    }
}

/// Ensures image layers exist, building missing ones.
pub struct ImageLayerCache<'a, E: ContainerEngine + ?Sized> {
    engine: &'a E,
    images_dir: PathBuf,
    context: PathBuf,
    failed: HashMap<String, Option<i32>>,
}

impl<'a, E: ContainerEngine + ?Sized> ImageLayerCache<'a, E> {
    /// `images_dir` holds `<tree>/Dockerfile.<descriptor>`; `context` is the
    /// docker build context.
    pub fn new(engine: &'a E, images_dir: impl AsRef<Path>, context: impl AsRef<Path>) -> Self {
        ImageLayerCache {
            engine,
            images_dir: images_dir.as_ref().to_path_buf(),
            context: context.as_ref().to_path_buf(),
            failed: HashMap::new(),
        }
    }

    /// Build request for a layer.
    pub fn build_for(&self, layer: &ImageLayer) -> ImageBuild {
        ImageBuild {
            name: layer.name.clone(),
            dockerfile: layer.dockerfile(&self.images_dir),
            context: self.context.clone(),
            build_args: layer.build_args.clone(),
        }
    }

    /// Make sure one layer exists.
    pub fn ensure_layer(
        &mut self,
        layer: &ImageLayer,
        log: &mut LogSink,
        on_event: &mut dyn FnMut(MatrixEvent),
    ) -> Result<LayerStatus, LayerError> {
        if let Some(code) = self.failed.get(&layer.name) {
            tracing::debug!("Layer {} already failed in this run", layer.name);
            return Err(LayerError::BuildFailed {
                image: layer.name.clone(),
                code: *code,
            });
        }

        let exists = self
            .engine
            .image_exists(&layer.name)
            .map_err(|e| LayerError::Engine {
                image: layer.name.clone(),
                message: format!("{:#}", e),
            })?;

        if exists {
            tracing::debug!("Layer {} is cached", layer.name);
            on_event(MatrixEvent::ImageCached {
                image: layer.name.clone(),
            });
            return Ok(LayerStatus::Cached);
        }

        on_event(MatrixEvent::ImageBuilding {
            image: layer.name.clone(),
            level: layer.level,
        });

        let build = self.build_for(layer);
        let start = Instant::now();
        let status = self
            .engine
            .build_image(&build, log)
            .map_err(|e| LayerError::Engine {
                image: layer.name.clone(),
                message: format!("{:#}", e),
            })?;

        if !status.is_success() {
            tracing::warn!("Build of {} exited with {:?}", layer.name, status.code);
            self.failed.insert(layer.name.clone(), status.code);
            on_event(MatrixEvent::ImageFailed {
                image: layer.name.clone(),
                code: status.code,
            });
            return Err(LayerError::BuildFailed {
                image: layer.name.clone(),
                code: status.code,
            });
        }

        on_event(MatrixEvent::ImageBuilt {
            image: layer.name.clone(),
            duration_ms: start.elapsed().as_millis() as u64,
        });
        Ok(LayerStatus::Built)
    }

    /// Ensure the base, toolchain and (when given) runtime layers of a
    /// target, in that order. Stops at the first failing level.
    pub fn ensure_chain(
        &mut self,
        target: TargetPlatform,
        runtime: Option<&RuntimeDescriptor>,
        log: &mut LogSink,
        on_event: &mut dyn FnMut(MatrixEvent),
    ) -> Result<(), LayerError> {
        for layer in ImageLayer::chain(target, runtime) {
            self.ensure_layer(&layer, log, on_event)?;
        }
        Ok(())
    }

    /// Names of the layers that failed to build during this run.
    pub fn failed_layers(&self) -> impl Iterator<Item = &str> {
        self.failed.keys().map(|s| s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::engine::RunStatus;
    use crate::test_support::{descriptor, MockEngine};

    fn no_events() -> impl FnMut(MatrixEvent) {
        |_| {}
    }

    #[test]
    fn test_second_ensure_performs_no_build() {
        let engine = MockEngine::new();
        let mut cache = ImageLayerCache::new(&engine, "/images", ".");
        let mut log = LogSink::memory();
        let layer = ImageLayer::base(crate::core::Tree::Manylinux);

        let first = cache.ensure_layer(&layer, &mut log, &mut no_events()).unwrap();
        let second = cache.ensure_layer(&layer, &mut log, &mut no_events()).unwrap();

        assert_eq!(first, LayerStatus::Built);
        assert_eq!(second, LayerStatus::Cached);
        assert_eq!(engine.builds(), vec!["manylinux-lvl1-base".to_string()]);
    }

    #[test]
    fn test_existing_image_is_not_built() {
        let engine = MockEngine::new().with_image("manylinux-lvl1-base");
        let mut cache = ImageLayerCache::new(&engine, "/images", ".");
        let mut log = LogSink::memory();

        let status = cache
            .ensure_layer(
                &ImageLayer::base(crate::core::Tree::Manylinux),
                &mut log,
                &mut no_events(),
            )
            .unwrap();
        assert_eq!(status, LayerStatus::Cached);
        assert!(engine.builds().is_empty());
    }

    #[test]
    fn test_chain_builds_in_order_with_url() {
        let engine = MockEngine::new();
        let mut cache = ImageLayerCache::new(&engine, "/images", "/ctx");
        let mut log = LogSink::memory();
        let runtime = descriptor(12, TargetPlatform::ManylinuxAarch64);

        cache
            .ensure_chain(
                TargetPlatform::ManylinuxAarch64,
                Some(&runtime),
                &mut log,
                &mut no_events(),
            )
            .unwrap();

        let builds = engine.build_requests();
        let names: Vec<&str> = builds.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "manylinux-lvl1-base",
                "manylinux-lvl2-gcc-aarch64-linux-gnu",
                "manylinux-lvl3-cp312-manylinux_2_17_aarch64",
            ]
        );
        assert_eq!(
            builds[2].dockerfile,
            PathBuf::from(
                "/images/manylinux/Dockerfile.manylinux-lvl3-cp3xx-manylinux_2_17_aarch64"
            )
        );
        assert_eq!(builds[2].context, PathBuf::from("/ctx"));
        assert_eq!(
            builds[2].build_args,
            vec![("PYTHON_URL".to_string(), runtime.download_url.clone())]
        );
    }

    #[test]
    fn test_shared_base_built_once_across_targets() {
        let engine = MockEngine::new();
        let mut cache = ImageLayerCache::new(&engine, "/images", ".");
        let mut log = LogSink::memory();

        for target in [
            TargetPlatform::ManylinuxX86_64,
            TargetPlatform::ManylinuxAarch64,
            TargetPlatform::ManylinuxS390x,
        ] {
            cache
                .ensure_chain(target, None, &mut log, &mut no_events())
                .unwrap();
        }

        let base_builds = engine
            .builds()
            .into_iter()
            .filter(|n| n == "manylinux-lvl1-base")
            .count();
        assert_eq!(base_builds, 1);
        assert_eq!(engine.builds().len(), 4);
    }

    #[test]
    fn test_failed_build_stops_chain_and_is_remembered() {
        let engine = MockEngine::new()
            .with_build_status("manylinux-lvl2-gcc-riscv64-linux-gnu", RunStatus::exited(2));
        let mut cache = ImageLayerCache::new(&engine, "/images", ".");
        let mut log = LogSink::memory();
        let runtime = descriptor(13, TargetPlatform::ManylinuxRiscv64);

        let err = cache
            .ensure_chain(
                TargetPlatform::ManylinuxRiscv64,
                Some(&runtime),
                &mut log,
                &mut no_events(),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            LayerError::BuildFailed { ref image, code: Some(2) }
                if image == "manylinux-lvl2-gcc-riscv64-linux-gnu"
        ));

        // Runtime layer never attempted
        assert_eq!(engine.builds().len(), 2);

        // Second request fails fast without another build
        let again = cache
            .ensure_chain(
                TargetPlatform::ManylinuxRiscv64,
                Some(&descriptor(12, TargetPlatform::ManylinuxRiscv64)),
                &mut log,
                &mut no_events(),
            )
            .unwrap_err();
        assert_eq!(again.image(), "manylinux-lvl2-gcc-riscv64-linux-gnu");
        assert_eq!(engine.builds().len(), 2);
        assert_eq!(
            cache.failed_layers().collect::<Vec<_>>(),
            vec!["manylinux-lvl2-gcc-riscv64-linux-gnu"]
        );
    }

    #[test]
    fn test_events_emitted() {
        let engine = MockEngine::new().with_image("musllinux-lvl1-base");
        let mut cache = ImageLayerCache::new(&engine, "/images", ".");
        let mut log = LogSink::memory();
        let mut events = Vec::new();

        cache
            .ensure_chain(
                TargetPlatform::MusllinuxX86_64,
                None,
                &mut log,
                &mut |e| events.push(e),
            )
            .unwrap();

        assert_eq!(
            events[0],
            MatrixEvent::ImageCached {
                image: "musllinux-lvl1-base".to_string()
            }
        );
        assert!(matches!(events[1], MatrixEvent::ImageBuilding { .. }));
        assert!(matches!(events[2], MatrixEvent::ImageBuilt { .. }));
    }
}
