//! Container engine abstraction.
//!
//! Everything pookie asks of docker goes through [`ContainerEngine`]: an
//! existence check, an image build and a one-shot container run.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use anyhow::{bail, Result};

use crate::util::log::LogSink;
use crate::util::process::ProcessBuilder;

/// Mount point of the shared workspace inside every container.
pub const CONTAINER_WORKSPACE: &str = "/workspace";

/// Inputs to `docker build`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBuild {
    pub name: String,
    pub dockerfile: PathBuf,
    pub context: PathBuf,
    pub build_args: Vec<(String, String)>,
}

/// Inputs to a one-shot `docker run`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub image: String,
    /// Host directory mounted at [`CONTAINER_WORKSPACE`]
    pub workspace: PathBuf,
    /// Rendered command passed to `/bin/bash -c`
    pub command: String,
}

/// Where container output goes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputSink {
    /// The run's log sink.
    Log,
    /// The user's terminal.
    #[default]
    Terminal,
    /// The user's terminal, with the container's stdout sent to stderr.
    Stderr,
}

impl OutputSink {
    /// Terminal sink for a run. Machine-readable runs keep stdout for
    /// their own JSON lines.
    pub fn terminal(json: bool) -> Self {
        if json {
            OutputSink::Stderr
        } else {
            OutputSink::Terminal
        }
    }
}

/// Exit status of an engine invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStatus {
    /// `None` when the process was terminated by a signal
    pub code: Option<i32>,
}

impl RunStatus {
    pub fn success() -> Self {
        RunStatus { code: Some(0) }
    }

    pub fn exited(code: i32) -> Self {
        RunStatus { code: Some(code) }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<ExitStatus> for RunStatus {
    fn from(status: ExitStatus) -> Self {
        RunStatus {
            code: status.code(),
        }
    }
}

/// Operations pookie needs from a container runtime.
///
/// An `Err` means the engine itself could not be invoked. A command that ran
/// and failed is an `Ok` with a non-zero [`RunStatus`].
pub trait ContainerEngine {
    /// Whether an image with this exact name exists locally.
    fn image_exists(&self, name: &str) -> Result<bool>;

    /// Build an image, sending output to the log.
    fn build_image(&self, build: &ImageBuild, log: &mut LogSink) -> Result<RunStatus>;

    /// Run a command in a fresh, auto-removed container.
    fn run(&self, request: &RunRequest, output: OutputSink, log: &mut LogSink)
        -> Result<RunStatus>;
}

/// The docker CLI.
#[derive(Debug, Clone)]
pub struct DockerEngine {
    program: PathBuf,
}

impl DockerEngine {
    pub fn new() -> Self {
        DockerEngine {
            program: PathBuf::from("docker"),
        }
    }

    /// Use a specific docker binary.
    pub fn with_program(program: impl AsRef<Path>) -> Self {
        DockerEngine {
            program: program.as_ref().to_path_buf(),
        }
    }

    pub fn images_command(&self, name: &str) -> ProcessBuilder {
        ProcessBuilder::new(&self.program).args(["images", "-q", name])
    }

    pub fn build_command(&self, build: &ImageBuild) -> ProcessBuilder {
        let mut pb = ProcessBuilder::new(&self.program)
            .arg("build")
            .arg("-f")
            .arg(&build.dockerfile)
            .arg("-t")
            .arg(&build.name);
        for (key, value) in &build.build_args {
            pb = pb.arg("--build-arg").arg(format!("{}={}", key, value));
        }
        pb.arg(&build.context)
    }

    pub fn run_command(&self, request: &RunRequest) -> ProcessBuilder {
        ProcessBuilder::new(&self.program)
            .args(["run", "--rm", "-v"])
            .arg(format!(
                "{}:{}",
                request.workspace.display(),
                CONTAINER_WORKSPACE
            ))
            .args(["-w", CONTAINER_WORKSPACE])
            .arg(&request.image)
            .args(["/bin/bash", "-c"])
            .arg(&request.command)
    }
}

impl Default for DockerEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerEngine for DockerEngine {
    fn image_exists(&self, name: &str) -> Result<bool> {
        let output = self.images_command(name).exec()?;
        if !output.status.success() {
            bail!(
                "`docker images` failed for {}: {}",
                name,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(!String::from_utf8_lossy(&output.stdout).trim().is_empty())
    }

    fn build_image(&self, build: &ImageBuild, log: &mut LogSink) -> Result<RunStatus> {
        let pb = self.build_command(build);
        tracing::debug!("Running {}", pb.display_command());
        writeln!(log, "$ {}", pb.display_command())?;
        Ok(log.run(&pb)?.into())
    }

    fn run(
        &self,
        request: &RunRequest,
        output: OutputSink,
        log: &mut LogSink,
    ) -> Result<RunStatus> {
        let pb = self.run_command(request);
        tracing::debug!("Running {}", pb.display_command());

        let status = match output {
            OutputSink::Log => {
                writeln!(log, "$ {}", pb.display_command())?;
                log.run(&pb)?
            }
            OutputSink::Terminal => pb.status_to(Stdio::inherit(), Stdio::inherit())?,
            OutputSink::Stderr => pb.status_to(Stdio::from(io::stderr()), Stdio::inherit())?,
        };
        Ok(status.into())
    }
}
