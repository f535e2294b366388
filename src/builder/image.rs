//! Image layer naming.
//!
//! Every build environment is a chain of three images:
//!
//! ```text
//! {tree}-lvl1-base                      shared by every target of the tree
//!   -> {tree}-lvl2-{toolchain}          one per toolchain
//!     -> {tree}-lvl3-cp3{m}-{target}    one per (target, minor)
//! ```
//!
//! Names depend only on `(tree, level, target, minor)`, so the same function
//! names an image when it is built and when a container is started from it.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::{MinorVersion, RuntimeDescriptor, TargetPlatform, Tree};

/// Build argument carrying the runtime archive URL into level-3 images.
pub const PYTHON_URL_ARG: &str = "PYTHON_URL";

/// Position of an image in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Base,
    Toolchain,
    Runtime,
}

impl Level {
    pub const fn number(&self) -> u8 {
        match self {
            Level::Base => 1,
            Level::Toolchain => 2,
            Level::Runtime => 3,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lvl{}", self.number())
    }
}

/// One buildable image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageLayer {
    pub tree: Tree,
    pub level: Level,
    /// Image tag
    pub name: String,
    /// Dockerfile suffix; the file is `Dockerfile.{descriptor}`
    pub descriptor: String,
    pub build_args: Vec<(String, String)>,
}

impl ImageLayer {
    /// Level-1 generic base of a tree.
    pub fn base(tree: Tree) -> Self {
        let name = base_image_name(tree);
        ImageLayer {
            tree,
            level: Level::Base,
            descriptor: name.clone(),
            name,
            build_args: Vec::new(),
        }
    }

    /// Level-2 toolchain image of a target.
    pub fn toolchain(target: TargetPlatform) -> Self {
        let name = toolchain_image_name(target);
        ImageLayer {
            tree: target.tree(),
            level: Level::Toolchain,
            descriptor: name.clone(),
            name,
            build_args: Vec::new(),
        }
    }

    /// Level-3 image specialized for one runtime.
    pub fn runtime(runtime: &RuntimeDescriptor) -> Self {
        let target = runtime.target;
        ImageLayer {
            tree: target.tree(),
            level: Level::Runtime,
            name: runtime_image_name(target, runtime.minor),
            descriptor: format!("{}-lvl3-cp3xx-{}", target.tree(), target),
            build_args: vec![(PYTHON_URL_ARG.to_string(), runtime.download_url.clone())],
        }
    }

    /// The chain for a target, base first. The runtime level is included
    /// only when a descriptor is given.
    pub fn chain(target: TargetPlatform, runtime: Option<&RuntimeDescriptor>) -> Vec<Self> {
        let mut layers = vec![ImageLayer::base(target.tree()), ImageLayer::toolchain(target)];
        if let Some(runtime) = runtime {
            layers.push(ImageLayer::runtime(runtime));
        }
        layers
    }

    /// Location of the descriptor file under the images directory.
    pub fn dockerfile(&self, images_dir: &Path) -> PathBuf {
        images_dir
            .join(self.tree.as_str())
            .join(format!("Dockerfile.{}", self.descriptor))
    }
}

pub fn base_image_name(tree: Tree) -> String {
    format!("{}-lvl1-base", tree)
}

pub fn toolchain_image_name(target: TargetPlatform) -> String {
    format!("{}-lvl2-{}", target.tree(), target.toolchain())
}

/// Name of the image that build and test containers are started from.
pub fn runtime_image_name(target: TargetPlatform, minor: MinorVersion) -> String {
    format!("{}-lvl3-{}-{}", target.tree(), minor.cp_tag(), target)
}
