//! Command implementations

pub mod completions;
pub mod images;
pub mod plan;
pub mod run;
pub mod targets;
pub mod versions;

use std::path::PathBuf;

use anyhow::{bail, Result};

use crate::cli::{ComposeArgs, EnvironmentArgs, MatrixArgs};
use pookie::builder::events::{MatrixEvent, PhaseOutcome};
use pookie::builder::plan::Phase;
use pookie::builder::ComposeOptions;
use pookie::core::{MinorVersion, TargetPlatform};
use pookie::util::process::find_executable;
use pookie::util::shell::{format_duration, Spinner, Status};
use pookie::util::{Config, Shell};

const DEFAULT_IMAGES_DIR: &str = "/images";
const DEFAULT_WORKSPACE: &str = "/workspace";
const DEFAULT_LOG_FILE: &str = "pookie.log";

/// Targets from the command line, else config, else all.
pub fn targets(args: &MatrixArgs, config: &Config) -> Result<Vec<TargetPlatform>> {
    if !args.targets.is_empty() {
        return Ok(args.targets.clone());
    }
    Ok(config
        .targets()?
        .unwrap_or_else(|| TargetPlatform::ALL.to_vec()))
}

/// Requested minors from the command line, else config. `None` selects the
/// newest available.
pub fn python_versions(args: &MatrixArgs, config: &Config) -> Result<Option<Vec<MinorVersion>>> {
    if !args.python_versions.is_empty() {
        return Ok(Some(args.python_versions.clone()));
    }
    Ok(config.python_versions()?)
}

pub fn compose_options(args: &ComposeArgs, config: &Config) -> Result<ComposeOptions> {
    let compiler = match args.linux_x86_64_compiler {
        Some(c) => c,
        None => config.linux_compiler()?.unwrap_or_default(),
    };
    let non_native = match args.linux_non_native_mode {
        Some(m) => m,
        None => config.non_native_mode()?.unwrap_or_default(),
    };
    Ok(ComposeOptions {
        compiler,
        non_native,
    })
}

/// Resolved locations for image builds and logs.
pub struct Environment {
    pub images_dir: PathBuf,
    pub context: PathBuf,
    pub release_url: Option<String>,
    pub log_file: PathBuf,
}

impl Environment {
    pub fn new(args: &EnvironmentArgs, config: &Config) -> Self {
        Environment {
            images_dir: args
                .images_dir
                .clone()
                .or_else(|| config.images.dir.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_IMAGES_DIR)),
            context: args
                .context
                .clone()
                .or_else(|| config.images.context.clone())
                .unwrap_or_else(|| PathBuf::from(".")),
            release_url: args
                .release_url
                .clone()
                .or_else(|| config.release.url.clone()),
            log_file: args
                .log_file
                .clone()
                .or_else(|| config.workspace.log_file.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
        }
    }
}

pub fn workspace(cli: Option<PathBuf>, config: &Config) -> PathBuf {
    cli.or_else(|| config.workspace.host_path.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_WORKSPACE))
}

/// Fail fast when docker cannot be found.
pub fn require_docker() -> Result<()> {
    match find_executable("docker") {
        Some(path) => {
            tracing::debug!("Using docker at {}", path.display());
            Ok(())
        }
        None => bail!("`docker` was not found on PATH; pookie needs Docker to build images and run containers"),
    }
}

/// Turns matrix events into status lines, spinners or JSON lines.
pub struct EventPrinter<'a> {
    shell: &'a Shell,
    spinner: Option<Spinner>,
}

impl<'a> EventPrinter<'a> {
    pub fn new(shell: &'a Shell) -> Self {
        EventPrinter {
            shell,
            spinner: None,
        }
    }

    fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish();
        }
    }

    pub fn handle(&mut self, event: MatrixEvent) {
        if self.shell.is_json() {
            if let Ok(value) = serde_json::to_value(&event) {
                self.shell.json(&value);
            }
            return;
        }

        match event {
            MatrixEvent::ImageCached { image } => {
                if self.shell.is_verbose() {
                    self.shell.status(Status::Cached, image);
                }
            }
            MatrixEvent::ImageBuilding { image, level } => {
                self.stop_spinner();
                self.spinner = Some(
                    self.shell
                        .spinner(Status::Creating, format!("{} ({})", image, level)),
                );
            }
            MatrixEvent::ImageBuilt { image, duration_ms } => {
                self.stop_spinner();
                self.shell.status(
                    Status::Finished,
                    format!("{} in {}", image, millis(duration_ms)),
                );
            }
            MatrixEvent::ImageFailed { image, code } => {
                self.stop_spinner();
                self.shell
                    .status(Status::Failed, format!("{} ({})", image, exit(code)));
            }
            MatrixEvent::PhaseStarted {
                target,
                python,
                phase,
                ..
            } => {
                let what = pair(target, python);
                match phase {
                    Phase::Build => {
                        self.spinner = Some(self.shell.spinner(Status::Building, what));
                    }
                    Phase::Test => self.shell.status(Status::Testing, what),
                }
            }
            MatrixEvent::PhaseFinished {
                target,
                python,
                phase,
                outcome,
                duration_ms,
            } => {
                self.stop_spinner();
                let what = format!("{} {}", phase, pair(target, python));
                match outcome {
                    PhaseOutcome::Succeeded => self.shell.status(
                        Status::Finished,
                        format!("{} in {}", what, millis(duration_ms)),
                    ),
                    PhaseOutcome::Failed { code } => self
                        .shell
                        .status(Status::Failed, format!("{} ({})", what, exit(code))),
                    PhaseOutcome::Unsupported => self.shell.status(
                        Status::Unsupported,
                        format!("{} is not supported yet for {}", phase, target),
                    ),
                    PhaseOutcome::EnvironmentFailed { image, .. } => self.shell.status(
                        Status::Failed,
                        format!("{} (image `{}` could not be built)", what, image),
                    ),
                    PhaseOutcome::EngineError { message } => self
                        .shell
                        .status(Status::Failed, format!("{} ({})", what, message)),
                }
            }
            MatrixEvent::MatrixFinished {
                succeeded,
                failed,
                unsupported,
                duration_ms,
            } => {
                self.stop_spinner();
                let status = if failed > 0 {
                    Status::Failed
                } else {
                    Status::Finished
                };
                self.shell.status(
                    status,
                    format!(
                        "{} succeeded, {} failed, {} unsupported in {}",
                        succeeded,
                        failed,
                        unsupported,
                        millis(duration_ms)
                    ),
                );
            }
        }
    }
}

fn pair(target: TargetPlatform, python: MinorVersion) -> String {
    format!("{}-{}", python.cp_tag(), target)
}

fn millis(ms: u64) -> String {
    format_duration(std::time::Duration::from_millis(ms))
}

fn exit(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "killed by signal".to_string(),
    }
}
