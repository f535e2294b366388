//! `pookie images` command

use anyhow::{bail, Result};

use crate::cli::ImagesArgs;
use crate::commands::{self, Environment, EventPrinter};
use crate::GlobalOptions;
use pookie::builder::DockerEngine;
use pookie::ops::{ensure_images, resolve_versions, ImagesOptions, VersionsOptions};
use pookie::util::shell::Status;
use pookie::util::{GlobalContext, LogSink};

pub fn execute(args: ImagesArgs, global_opts: &GlobalOptions) -> Result<()> {
    let shell = &global_opts.shell;
    let ctx = GlobalContext::new()?;
    let config = ctx.config();

    let targets = commands::targets(&args.matrix, &config)?;
    let env = Environment::new(&args.env, &config);

    commands::require_docker()?;

    let versions_opts = VersionsOptions {
        release_url: env.release_url.clone(),
        python_versions: commands::python_versions(&args.matrix, &config)?,
        targets: targets.clone(),
    };
    shell.status(Status::Fetching, versions_opts.release_url());
    let resolved = resolve_versions(&versions_opts)?;

    if resolved.is_empty() {
        shell.println("No matching assets found in latest release.");
        return Ok(());
    }

    let mut log = LogSink::open(&env.log_file)?;
    let opts = ImagesOptions {
        targets,
        images_dir: env.images_dir,
        context: env.context,
    };

    let engine = DockerEngine::new();
    let mut printer = EventPrinter::new(shell);
    let report = ensure_images(&engine, &resolved, &opts, &mut log, &mut |event| {
        printer.handle(event)
    });

    if shell.is_json() {
        shell.json(&serde_json::to_value(&report)?);
    } else {
        shell.status(
            Status::Finished,
            format!("{} environment(s) ready", report.ready),
        );
    }

    if !report.failed.is_empty() {
        for failed in &report.failed {
            shell.error(format!(
                "cp{}-{}: {}",
                failed.python.nodot(),
                failed.target,
                failed.error
            ));
        }
        bail!(
            "{} environment(s) could not be built; see {}",
            report.failed.len(),
            env.log_file.display()
        );
    }

    Ok(())
}
