//! Build environments and container execution.
//!
//! This module implements the image layer cache, command composition for
//! each target class, and the container runner.

pub mod cache;
pub mod engine;
pub mod events;
pub mod image;
pub mod plan;
pub mod policy;
pub mod runner;
pub mod toolchain;

pub use cache::{ImageLayerCache, LayerError, LayerStatus};
pub use engine::{ContainerEngine, DockerEngine, OutputSink, RunStatus};
pub use events::{MatrixEvent, PhaseOutcome};
pub use image::{runtime_image_name, ImageLayer, Level};
pub use plan::{CommandPlan, Phase, Stage, StageKind, Step};
pub use policy::{CommandComposer, ComposeOptions, TargetPolicy};
pub use runner::ExecutionRunner;
pub use toolchain::LinuxCompiler;
