//! `pookie versions` command

use anyhow::Result;

use crate::cli::VersionsArgs;
use crate::commands;
use crate::GlobalOptions;
use pookie::core::RuntimeDescriptor;
use pookie::ops::{format_versions, resolve_versions, VersionsOptions};
use pookie::util::shell::Status;
use pookie::util::GlobalContext;

pub fn execute(args: VersionsArgs, global_opts: &GlobalOptions) -> Result<()> {
    let shell = &global_opts.shell;
    let ctx = GlobalContext::new()?;
    let config = ctx.config();

    let opts = VersionsOptions {
        release_url: args.release_url.or_else(|| config.release.url.clone()),
        python_versions: commands::python_versions(&args.matrix, &config)?,
        targets: commands::targets(&args.matrix, &config)?,
    };

    shell.status(Status::Fetching, opts.release_url());
    let resolved = resolve_versions(&opts)?;

    if shell.is_json() {
        let runtimes: Vec<&RuntimeDescriptor> = resolved
            .iter()
            .flat_map(|(_, targets)| targets.values())
            .collect();
        shell.json(&serde_json::to_value(runtimes)?);
        return Ok(());
    }

    if resolved.is_empty() {
        shell.println("No matching assets found in latest release.");
        return Ok(());
    }

    shell.println(format_versions(&resolved).trim_end());
    Ok(())
}
