//! Global context for pookie operations.
//!
//! Provides centralized access to the working directory and the
//! configuration file locations.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::util::config::{self, Config};

/// Process-wide paths and configuration.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Global config file (~/.pookie/config.toml), if a home directory exists
    global_config: Option<PathBuf>,
}

impl GlobalContext {
    /// Create a new GlobalContext rooted at the process working directory.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(Self::with_cwd(cwd))
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Self {
        GlobalContext {
            cwd,
            global_config: config::global_config_path(),
        }
    }

    /// Replace the global config location.
    pub fn with_global_config(mut self, path: Option<PathBuf>) -> Self {
        self.global_config = path;
        self
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn global_config_path(&self) -> Option<&Path> {
        self.global_config.as_deref()
    }

    pub fn project_config_path(&self) -> PathBuf {
        config::project_config_path(&self.cwd)
    }

    /// Load the merged global and project configuration.
    pub fn config(&self) -> Config {
        let project = self.project_config_path();
        tracing::debug!(
            "Loading config (global: {:?}, project: {})",
            self.global_config,
            project.display()
        );
        config::load_config(self.global_config.as_deref(), &project)
    }
}
