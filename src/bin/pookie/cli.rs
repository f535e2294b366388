//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use pookie::builder::LinuxCompiler;
use pookie::core::{MinorVersion, NonNativeMode, TargetPlatform};
use pookie::util::shell::ColorChoice;

/// pookie - build and test native Python libraries across platforms
#[derive(Parser)]
#[command(name = "pookie")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Coloring: auto, always, never
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    pub color: ColorChoice,

    /// Output format for messages
    #[arg(long, global = true, value_enum, default_value_t = MessageFormat::Human)]
    pub message_format: MessageFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MessageFormat {
    Human,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build and/or test across the target x Python matrix
    Run(RunArgs),

    /// Resolve and print the available Python distributions
    Versions(VersionsArgs),

    /// Build the container images of the matrix without running anything
    Images(ImagesArgs),

    /// Print the commands each container would run
    Plan(PlanArgs),

    /// List supported target platforms
    Targets,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// The two matrix axes.
#[derive(Args, Debug, Clone, Default)]
pub struct MatrixArgs {
    /// Minor Python version(s), e.g. `12` or `3.12` (default: the newest 4)
    #[arg(long = "python-version", value_name = "VERSION", num_args = 1..)]
    pub python_versions: Vec<MinorVersion>,

    /// Target platform(s) (default: all)
    #[arg(long = "target", value_name = "TARGET", num_args = 1..)]
    pub targets: Vec<TargetPlatform>,
}

/// Compiler and emulation choices.
#[derive(Args, Debug, Clone, Default)]
pub struct ComposeArgs {
    /// Compiler for the x86_64 Linux targets: gcc or clang (default: gcc)
    #[arg(long = "linux-x86_64-compiler", value_name = "COMPILER")]
    pub linux_x86_64_compiler: Option<LinuxCompiler>,

    /// Mode for non-native Linux targets: cross or emulate (default: cross)
    #[arg(long, value_name = "MODE")]
    pub linux_non_native_mode: Option<NonNativeMode>,
}

/// Where image descriptors and runtime metadata come from.
#[derive(Args, Debug, Clone, Default)]
pub struct EnvironmentArgs {
    /// Directory holding `<tree>/Dockerfile.<descriptor>` files (default: /images)
    #[arg(long, value_name = "DIR")]
    pub images_dir: Option<PathBuf>,

    /// Docker build context (default: current directory)
    #[arg(long, value_name = "DIR")]
    pub context: Option<PathBuf>,

    /// Latest-release metadata URL (https:// or file://)
    #[arg(long, value_name = "URL")]
    pub release_url: Option<String>,

    /// Log file for image builds and build output (default: pookie.log)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Args)]
pub struct RunArgs {
    /// Build command, run in each build container
    #[arg(long, value_name = "CMD")]
    pub build: Option<String>,

    /// Test command, run in each test container
    #[arg(long, value_name = "CMD")]
    pub test: Option<String>,

    #[command(flatten)]
    pub matrix: MatrixArgs,

    #[command(flatten)]
    pub compose: ComposeArgs,

    #[command(flatten)]
    pub env: EnvironmentArgs,

    /// Host directory mounted at /workspace (default: /workspace)
    #[arg(long, env = "WORKSPACE_PWD", value_name = "DIR")]
    pub workspace: Option<PathBuf>,
}

#[derive(Args)]
pub struct VersionsArgs {
    #[command(flatten)]
    pub matrix: MatrixArgs,

    /// Latest-release metadata URL (https:// or file://)
    #[arg(long, value_name = "URL")]
    pub release_url: Option<String>,
}

#[derive(Args)]
pub struct ImagesArgs {
    #[command(flatten)]
    pub matrix: MatrixArgs,

    #[command(flatten)]
    pub env: EnvironmentArgs,
}

#[derive(Args)]
pub struct PlanArgs {
    /// Build command to compose
    #[arg(long, value_name = "CMD")]
    pub build: Option<String>,

    /// Test command to compose
    #[arg(long, value_name = "CMD")]
    pub test: Option<String>,

    #[command(flatten)]
    pub matrix: MatrixArgs,

    #[command(flatten)]
    pub compose: ComposeArgs,

    /// Output plans as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
