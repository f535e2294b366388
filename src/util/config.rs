//! Configuration file support for pookie.
//!
//! pookie supports two configuration file locations:
//! - Global: `~/.pookie/config.toml` - User-wide defaults
//! - Project: `.pookie/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config. Command-line flags
//! take precedence over both.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::builder::toolchain::LinuxCompiler;
use crate::core::{MinorVersion, NonNativeMode, ParseSettingError, TargetPlatform};

/// Name of the per-user and per-project configuration directory.
pub const CONFIG_DIR_NAME: &str = ".pookie";

/// pookie configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default matrix
    pub matrix: MatrixConfig,

    /// Build settings
    pub build: BuildConfig,

    /// Image descriptor locations
    pub images: ImagesConfig,

    /// Workspace mount and run log
    pub workspace: WorkspaceConfig,

    /// Release metadata source
    pub release: ReleaseConfig,
}

/// Default matrix axes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct MatrixConfig {
    /// Target platform ids (e.g. `manylinux_2_17_x86_64`)
    pub targets: Option<Vec<String>>,

    /// Python minors (`"12"` or `"3.12"`)
    pub python_versions: Option<Vec<String>>,
}

/// Build-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BuildConfig {
    /// gcc or clang
    pub linux_x86_64_compiler: Option<String>,

    /// cross or emulate
    pub linux_non_native_mode: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagesConfig {
    /// Root directory holding `<tree>/Dockerfile.<descriptor>` files
    pub dir: Option<PathBuf>,

    /// Docker build context
    pub context: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct WorkspaceConfig {
    /// Host directory mounted at `/workspace`
    pub host_path: Option<PathBuf>,

    /// Run log location
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseConfig {
    /// Latest-release metadata URL (`https://` or `file://`)
    pub url: Option<String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        // Matrix
        if other.matrix.targets.is_some() {
            self.matrix.targets = other.matrix.targets;
        }
        if other.matrix.python_versions.is_some() {
            self.matrix.python_versions = other.matrix.python_versions;
        }

        // Build settings
        if other.build.linux_x86_64_compiler.is_some() {
            self.build.linux_x86_64_compiler = other.build.linux_x86_64_compiler;
        }
        if other.build.linux_non_native_mode.is_some() {
            self.build.linux_non_native_mode = other.build.linux_non_native_mode;
        }

        // Images
        if other.images.dir.is_some() {
            self.images.dir = other.images.dir;
        }
        if other.images.context.is_some() {
            self.images.context = other.images.context;
        }

        // Workspace
        if other.workspace.host_path.is_some() {
            self.workspace.host_path = other.workspace.host_path;
        }
        if other.workspace.log_file.is_some() {
            self.workspace.log_file = other.workspace.log_file;
        }

        if other.release.url.is_some() {
            self.release.url = other.release.url;
        }
    }

    /// Parse the configured target ids.
    pub fn targets(&self) -> Result<Option<Vec<TargetPlatform>>, ParseSettingError> {
        self.matrix
            .targets
            .as_ref()
            .map(|ids| ids.iter().map(|id| id.parse()).collect())
            .transpose()
    }

    /// Parse the configured Python minors.
    pub fn python_versions(&self) -> Result<Option<Vec<MinorVersion>>, ParseSettingError> {
        self.matrix
            .python_versions
            .as_ref()
            .map(|vs| vs.iter().map(|v| v.parse()).collect())
            .transpose()
    }

    /// Parse the configured native Linux compiler.
    pub fn linux_compiler(&self) -> Result<Option<LinuxCompiler>, ParseSettingError> {
        self.build
            .linux_x86_64_compiler
            .as_deref()
            .map(str::parse)
            .transpose()
    }

    /// Parse the configured non-native Linux mode.
    pub fn non_native_mode(&self) -> Result<Option<NonNativeMode>, ParseSettingError> {
        self.build
            .linux_non_native_mode
            .as_deref()
            .map(str::parse)
            .transpose()
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.pookie/config.toml)
/// 2. Global config (~/.pookie/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    // Load global config first
    if let Some(global_path) = global_path {
        if global_path.exists() {
            config.merge(Config::load_or_default(global_path));
        }
    }

    // Project config overrides global
    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}

/// Get the global pookie config directory (~/.pookie).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(CONFIG_DIR_NAME))
}

/// Get the global config path (~/.pookie/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.pookie/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_DIR_NAME).join("config.toml")
}
