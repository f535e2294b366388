//! One-shot container execution of composed plans.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::builder::engine::{ContainerEngine, OutputSink, RunRequest, RunStatus};
use crate::builder::plan::CommandPlan;
use crate::util::log::LogSink;

/// Runs command plans in fresh containers over the shared workspace.
pub struct ExecutionRunner<'a, E: ContainerEngine + ?Sized> {
    engine: &'a E,
    workspace: PathBuf,
}

impl<'a, E: ContainerEngine + ?Sized> ExecutionRunner<'a, E> {
    /// `workspace` is the host path mounted at `/workspace`.
    pub fn new(engine: &'a E, workspace: impl AsRef<Path>) -> Self {
        ExecutionRunner {
            engine,
            workspace: workspace.as_ref().to_path_buf(),
        }
    }

    /// Run a plan once in `image`. No retries and no container reuse.
    ///
    /// An unsupported plan is refused with an error and nothing is launched.
    pub fn run(
        &self,
        image: &str,
        plan: &CommandPlan,
        output: OutputSink,
        log: &mut LogSink,
    ) -> Result<RunStatus> {
        let command = plan
            .render()
            .context("refusing to launch a container for an unsupported plan")?;

        let request = RunRequest {
            image: image.to_string(),
            workspace: self.workspace.clone(),
            command,
        };

        tracing::debug!("Starting container from {}", image);
        self.engine
            .run(&request, output, log)
            .with_context(|| format!("failed to start a container from `{}`", image))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::plan::{Phase, Stage};
    use crate::core::TargetPlatform;
    use crate::test_support::MockEngine;

    #[test]
    fn test_run_passes_rendered_plan() {
        let engine = MockEngine::new();
        let runner = ExecutionRunner::new(&engine, "/host/ws");
        let plan = CommandPlan::pipeline([Stage::user("python3 -m build")]);
        let mut log = LogSink::memory();

        let status = runner
            .run("img", &plan, OutputSink::Log, &mut log)
            .unwrap();

        assert!(status.is_success());
        let runs = engine.run_requests();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].0.image, "img");
        assert_eq!(runs[0].0.workspace, PathBuf::from("/host/ws"));
        assert_eq!(runs[0].0.command, "python3 -m build");
        assert_eq!(runs[0].1, OutputSink::Log);
    }

    #[test]
    fn test_unsupported_plan_never_launches() {
        let engine = MockEngine::new();
        let runner = ExecutionRunner::new(&engine, "/ws");
        let plan = CommandPlan::Unsupported {
            target: TargetPlatform::WinAmd64,
            phase: Phase::Test,
        };
        let mut log = LogSink::memory();

        let err = runner
            .run("img", &plan, OutputSink::Terminal, &mut log)
            .unwrap_err();
        assert!(format!("{:#}", err).contains("not supported"));
        assert!(engine.run_requests().is_empty());
    }

    #[test]
    fn test_nonzero_exit_is_reported_not_raised() {
        let engine = MockEngine::new().with_run_status("img", RunStatus::exited(3));
        let runner = ExecutionRunner::new(&engine, "/ws");
        let plan = CommandPlan::pipeline([Stage::user("false")]);
        let mut log = LogSink::memory();

        let status = runner
            .run("img", &plan, OutputSink::Log, &mut log)
            .unwrap();
        assert_eq!(status.code, Some(3));
    }
}
