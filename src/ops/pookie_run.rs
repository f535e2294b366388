//! Implementation of `pookie run`.
//!
//! The matrix is walked target-outer, minor-inner: targets in the order
//! they were requested (duplicates dropped), minors ascending. For each pair
//! the image chain is ensured once, then build runs before test.

use std::path::PathBuf;
use std::time::Instant;

use serde::Serialize;

use crate::builder::cache::{ImageLayerCache, LayerError};
use crate::builder::engine::{ContainerEngine, OutputSink};
use crate::builder::events::{MatrixEvent, PhaseOutcome};
use crate::builder::image::runtime_image_name;
use crate::builder::plan::{CommandPlan, Phase};
use crate::builder::policy::{CommandComposer, ComposeOptions};
use crate::builder::runner::ExecutionRunner;
use crate::core::{MinorVersion, ResolvedVersions, RuntimeDescriptor, TargetPlatform};
use crate::util::log::LogSink;

/// Options for running the matrix.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Requested targets, in matrix order
    pub targets: Vec<TargetPlatform>,

    /// User build command (None = no build phase)
    pub build: Option<String>,

    /// User test command (None = no test phase)
    pub test: Option<String>,

    /// Compiler and non-native mode
    pub compose: ComposeOptions,

    /// Directory holding `<tree>/Dockerfile.<descriptor>`
    pub images_dir: PathBuf,

    /// Docker build context
    pub context: PathBuf,

    /// Host path mounted at `/workspace`
    pub workspace: PathBuf,

    /// Where test container output goes (build output always goes to the log)
    pub test_output: OutputSink,
}

/// Outcome of one `(target, minor)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairReport {
    pub target: TargetPlatform,
    pub python: MinorVersion,
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build: Option<PhaseOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test: Option<PhaseOutcome>,
}

impl PairReport {
    fn outcomes(&self) -> impl Iterator<Item = &PhaseOutcome> {
        self.build.iter().chain(self.test.iter())
    }

    pub fn is_failure(&self) -> bool {
        self.outcomes().any(PhaseOutcome::is_failure)
    }
}

/// Everything that happened in one matrix run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatrixReport {
    pub pairs: Vec<PairReport>,
    pub duration_ms: u64,
}

impl MatrixReport {
    fn count(&self, pred: impl Fn(&PhaseOutcome) -> bool) -> usize {
        self.pairs
            .iter()
            .flat_map(|p| p.outcomes())
            .filter(|o| pred(o))
            .count()
    }

    /// Phases that succeeded.
    pub fn succeeded(&self) -> usize {
        self.count(|o| matches!(o, PhaseOutcome::Succeeded))
    }

    /// Phases that failed, including environment failures.
    pub fn failed(&self) -> usize {
        self.count(PhaseOutcome::is_failure)
    }

    pub fn unsupported(&self) -> usize {
        self.count(|o| matches!(o, PhaseOutcome::Unsupported))
    }

    pub fn has_failures(&self) -> bool {
        self.pairs.iter().any(PairReport::is_failure)
    }
}

/// The pairs a run visits, in order. Pairs with no resolved runtime are
/// left out.
pub fn matrix_pairs<'r>(
    targets: &[TargetPlatform],
    resolved: &'r ResolvedVersions,
) -> Vec<&'r RuntimeDescriptor> {
    let mut seen = Vec::with_capacity(targets.len());
    let mut pairs = Vec::new();

    for target in targets {
        if seen.contains(target) {
            continue;
        }
        seen.push(*target);

        for minor in resolved.minors() {
            if let Some(runtime) = resolved.get(minor, *target) {
                pairs.push(runtime);
            }
        }
    }

    pairs
}

/// Run the build/test matrix.
///
/// Every failure is local to its pair: a broken image chain, a container
/// exiting non-zero or the engine erroring is recorded in the report and the
/// run moves on to the next pair.
pub fn run_matrix<E: ContainerEngine + ?Sized>(
    engine: &E,
    resolved: &ResolvedVersions,
    opts: &RunOptions,
    log: &mut LogSink,
    on_event: &mut dyn FnMut(MatrixEvent),
) -> MatrixReport {
    let start = Instant::now();
    let composer = CommandComposer::new(opts.compose);
    let mut cache = ImageLayerCache::new(engine, &opts.images_dir, &opts.context);
    let runner = ExecutionRunner::new(engine, &opts.workspace);
    let mut report = MatrixReport::default();

    for runtime in matrix_pairs(&opts.targets, resolved) {
        let (target, minor) = (runtime.target, runtime.minor);
        let image = runtime_image_name(target, minor);
        tracing::debug!("Pair {} / Python {}", target, minor.dotted());

        let build_plan = opts
            .build
            .as_deref()
            .map(|cmd| composer.compose_build(target, minor, cmd));
        let test_plan = opts
            .test
            .as_deref()
            .map(|cmd| composer.compose_test(target, minor, cmd));

        let mut pair = PairReport {
            target,
            python: minor,
            image: image.clone(),
            build: None,
            test: None,
        };

        let launches = build_plan.is_some()
            || test_plan.as_ref().is_some_and(CommandPlan::is_supported);

        if launches {
            if let Err(err) = cache.ensure_chain(target, Some(runtime), log, on_event) {
                let env_failure = match err {
                    LayerError::BuildFailed { image, code } => {
                        PhaseOutcome::EnvironmentFailed { image, code }
                    }
                    err @ LayerError::Engine { .. } => {
                        tracing::warn!("{}", err);
                        PhaseOutcome::EngineError {
                            message: err.to_string(),
                        }
                    }
                };
                if build_plan.is_some() {
                    pair.build =
                        Some(finish(on_event, &pair, Phase::Build, env_failure.clone(), 0));
                }
                if let Some(plan) = &test_plan {
                    let outcome = if plan.is_supported() {
                        env_failure
                    } else {
                        PhaseOutcome::Unsupported
                    };
                    pair.test = Some(finish(on_event, &pair, Phase::Test, outcome, 0));
                }
                report.pairs.push(pair);
                continue;
            }
        }

        if let Some(plan) = &build_plan {
            let outcome = run_phase(
                &runner, on_event, &pair, Phase::Build, plan, OutputSink::Log, log,
            );
            pair.build = Some(outcome);
        }

        if let Some(plan) = &test_plan {
            let outcome = run_phase(
                &runner,
                on_event,
                &pair,
                Phase::Test,
                plan,
                opts.test_output,
                log,
            );
            pair.test = Some(outcome);
        }

        report.pairs.push(pair);
    }

    report.duration_ms = start.elapsed().as_millis() as u64;
    on_event(MatrixEvent::MatrixFinished {
        succeeded: report.succeeded(),
        failed: report.failed(),
        unsupported: report.unsupported(),
        duration_ms: report.duration_ms,
    });

    report
}

fn run_phase<E: ContainerEngine + ?Sized>(
    runner: &ExecutionRunner<'_, E>,
    on_event: &mut dyn FnMut(MatrixEvent),
    pair: &PairReport,
    phase: Phase,
    plan: &CommandPlan,
    output: OutputSink,
    log: &mut LogSink,
) -> PhaseOutcome {
    if !plan.is_supported() {
        return finish(on_event, pair, phase, PhaseOutcome::Unsupported, 0);
    }

    on_event(MatrixEvent::PhaseStarted {
        target: pair.target,
        python: pair.python,
        phase,
        image: pair.image.clone(),
    });

    let start = Instant::now();
    let outcome = match runner.run(&pair.image, plan, output, log) {
        Ok(status) if status.is_success() => PhaseOutcome::Succeeded,
        Ok(status) => PhaseOutcome::Failed { code: status.code },
        Err(err) => {
            tracing::warn!("{:#}", err);
            PhaseOutcome::EngineError {
                message: format!("{:#}", err),
            }
        }
    };

    finish(
        on_event,
        pair,
        phase,
        outcome,
        start.elapsed().as_millis() as u64,
    )
}

fn finish(
    on_event: &mut dyn FnMut(MatrixEvent),
    pair: &PairReport,
    phase: Phase,
    outcome: PhaseOutcome,
    duration_ms: u64,
) -> PhaseOutcome {
    on_event(MatrixEvent::PhaseFinished {
        target: pair.target,
        python: pair.python,
        phase,
        outcome: outcome.clone(),
        duration_ms,
    });
    outcome
}
