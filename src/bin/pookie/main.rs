//! pookie CLI - cross-build and test Python wheels with Docker

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use pookie::util::Shell;

mod cli;
mod commands;

use cli::{Cli, Commands, MessageFormat};

/// Options shared by every command.
pub struct GlobalOptions {
    pub shell: Shell,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("pookie=debug")
    } else if cli.quiet {
        EnvFilter::new("pookie=error")
    } else {
        EnvFilter::new("pookie=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let global_opts = GlobalOptions {
        shell: Shell::from_flags(
            cli.quiet,
            cli.verbose,
            cli.color,
            cli.message_format == MessageFormat::Json,
        ),
    };

    // Execute command
    match cli.command {
        Commands::Run(args) => commands::run::execute(args, &global_opts),
        Commands::Versions(args) => commands::versions::execute(args, &global_opts),
        Commands::Images(args) => commands::images::execute(args, &global_opts),
        Commands::Plan(args) => commands::plan::execute(args, &global_opts),
        Commands::Targets => commands::targets::execute(&global_opts),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
