//! `pookie plan` command
//!
//! Shows what `pookie run` would execute. Needs neither network nor docker,
//! so Python versions must be given explicitly or come from config.

use anyhow::{Context, Result};

use crate::cli::PlanArgs;
use crate::commands;
use crate::GlobalOptions;
use pookie::ops::{format_plan, plan_matrix, PlanOptions};
use pookie::util::GlobalContext;

pub fn execute(args: PlanArgs, global_opts: &GlobalOptions) -> Result<()> {
    let shell = &global_opts.shell;
    let ctx = GlobalContext::new()?;
    let config = ctx.config();

    let python_versions = commands::python_versions(&args.matrix, &config)?
        .context("no Python versions given; pass --python-version or set matrix.python-versions")?;

    let opts = PlanOptions {
        targets: commands::targets(&args.matrix, &config)?,
        python_versions,
        build: args.build,
        test: args.test,
        compose: commands::compose_options(&args.compose, &config)?,
    };

    let planned = plan_matrix(&opts)?;

    if args.json || shell.is_json() {
        println!("{}", serde_json::to_string_pretty(&planned)?);
    } else {
        print!("{}", format_plan(&planned));
    }

    Ok(())
}
