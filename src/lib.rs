//! pookie - cross-build and test Python wheels across a platform matrix
//!
//! This crate provides the core library functionality for pookie,
//! including runtime resolution, the layered image cache, per-platform
//! command composition, and sequential execution of the build matrix.

pub mod builder;
pub mod core;
pub mod ops;
pub mod sources;
pub mod util;

/// Test utilities and mocks for pookie unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides a recording container engine and static
/// release fixtures.
#[cfg(test)]
pub mod test_support;

pub use core::{MinorVersion, ResolvedVersions, RuntimeDescriptor, TargetPlatform};

pub use builder::{CommandComposer, CommandPlan, ContainerEngine, DockerEngine};
pub use ops::{run_matrix, MatrixReport, RunOptions};
pub use util::context::GlobalContext;
