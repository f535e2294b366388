//! `pookie run` command

use anyhow::{bail, Result};

use crate::cli::RunArgs;
use crate::commands::{self, Environment, EventPrinter};
use crate::GlobalOptions;
use pookie::builder::{DockerEngine, OutputSink};
use pookie::ops::{format_versions, resolve_versions, run_matrix, RunOptions, VersionsOptions};
use pookie::util::shell::Status;
use pookie::util::{GlobalContext, LogSink};

pub fn execute(args: RunArgs, global_opts: &GlobalOptions) -> Result<()> {
    let shell = &global_opts.shell;

    if args.build.is_none() && args.test.is_none() {
        bail!("nothing to run; pass --build and/or --test (`pookie images` only prepares images)");
    }

    let ctx = GlobalContext::new()?;
    let config = ctx.config();

    let targets = commands::targets(&args.matrix, &config)?;
    let python_versions = commands::python_versions(&args.matrix, &config)?;
    let compose = commands::compose_options(&args.compose, &config)?;
    let env = Environment::new(&args.env, &config);
    let workspace = commands::workspace(args.workspace, &config);

    if shell.is_verbose() {
        shell.note("Configuration");
        let minors = python_versions
            .as_ref()
            .map(|vs| vs.iter().map(|v| v.dotted()).collect::<Vec<_>>().join(", "))
            .unwrap_or_else(|| "newest available".to_string());
        let target_list = targets
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        for (key, value) in [
            ("build", args.build.as_deref().unwrap_or("-").to_string()),
            ("test", args.test.as_deref().unwrap_or("-").to_string()),
            ("python-version", minors),
            ("target", target_list),
            ("linux-x86_64-compiler", compose.compiler.to_string()),
            ("linux-non-native-mode", compose.non_native.to_string()),
            ("workspace", workspace.display().to_string()),
            ("images-dir", env.images_dir.display().to_string()),
            ("log-file", env.log_file.display().to_string()),
        ] {
            shell.note(format!("- {}: {}", key, value));
        }
    }

    commands::require_docker()?;

    let versions_opts = VersionsOptions {
        release_url: env.release_url.clone(),
        python_versions,
        targets: targets.clone(),
    };
    shell.status(Status::Fetching, versions_opts.release_url());
    let resolved = resolve_versions(&versions_opts)?;

    if resolved.is_empty() {
        shell.println("No matching assets found in latest release.");
        return Ok(());
    }

    shell.status(
        Status::Resolved,
        format!(
            "Python {}",
            resolved
                .minors()
                .map(|m| m.dotted())
                .collect::<Vec<_>>()
                .join(", ")
        ),
    );
    if shell.is_verbose() {
        eprint!("{}", format_versions(&resolved));
    }

    let mut log = LogSink::open(&env.log_file)?;
    let opts = RunOptions {
        targets,
        build: args.build,
        test: args.test,
        compose,
        images_dir: env.images_dir,
        context: env.context,
        workspace,
        test_output: OutputSink::terminal(shell.is_json()),
    };

    let engine = DockerEngine::new();
    let mut printer = EventPrinter::new(shell);
    let report = run_matrix(&engine, &resolved, &opts, &mut log, &mut |event| {
        printer.handle(event)
    });

    if shell.is_json() {
        let mut value = serde_json::to_value(&report)?;
        if let Some(obj) = value.as_object_mut() {
            obj.insert("reason".to_string(), "matrix-report".into());
        }
        shell.json(&value);
    }

    if report.has_failures() {
        bail!(
            "{} phase(s) failed; build output is in {}",
            report.failed(),
            env.log_file.display()
        );
    }

    Ok(())
}
