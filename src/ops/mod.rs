//! High-level operations.
//!
//! This module contains the implementation of pookie commands.

pub mod pookie_images;
pub mod pookie_plan;
pub mod pookie_run;
pub mod pookie_versions;

pub use pookie_images::{ensure_images, FailedEnvironment, ImagesOptions, ImagesReport};
pub use pookie_plan::{format_plan, plan_matrix, PlanOptions, PlannedPhase};
pub use pookie_run::{matrix_pairs, run_matrix, MatrixReport, PairReport, RunOptions};
pub use pookie_versions::{
    format_versions, resolve_versions, resolve_versions_from, VersionsOptions,
};
