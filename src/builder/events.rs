//! Matrix event types for JSON output.
//!
//! This module defines the stable JSON schema for machine-readable run
//! output. These events are emitted when using `--message-format=json`;
//! in human mode the same events drive the status lines.
//!
//! # Event Types
//!
//! - `image-cached`: a layer already existed
//! - `image-building` / `image-built` / `image-failed`: a layer build
//! - `phase-started` / `phase-finished`: one build or test container
//! - `matrix-finished`: totals for the whole run
//!
//! # Stability
//!
//! New fields may be added, but existing fields should not be removed or renamed.

use serde::Serialize;

use crate::builder::image::Level;
use crate::builder::plan::Phase;
use crate::core::{MinorVersion, TargetPlatform};

/// Result of one phase of one matrix pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum PhaseOutcome {
    /// The container exited with status 0.
    Succeeded,
    /// The container exited non-zero, or was killed (`code` is null).
    Failed { code: Option<i32> },
    /// The target has no support for this phase; nothing was launched.
    Unsupported,
    /// The image chain could not be built.
    EnvironmentFailed { image: String, code: Option<i32> },
    /// The container engine itself errored for this pair.
    EngineError { message: String },
}

impl PhaseOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            PhaseOutcome::Failed { .. }
                | PhaseOutcome::EnvironmentFailed { .. }
                | PhaseOutcome::EngineError { .. }
        )
    }
}

/// An event emitted while the matrix runs.
///
/// Each event is serialized as a single JSON object per line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "kebab-case")]
pub enum MatrixEvent {
    ImageCached {
        image: String,
    },
    ImageBuilding {
        image: String,
        level: Level,
    },
    ImageBuilt {
        image: String,
        duration_ms: u64,
    },
    ImageFailed {
        image: String,
        code: Option<i32>,
    },
    PhaseStarted {
        target: TargetPlatform,
        python: MinorVersion,
        phase: Phase,
        image: String,
    },
    PhaseFinished {
        target: TargetPlatform,
        python: MinorVersion,
        phase: Phase,
        outcome: PhaseOutcome,
        duration_ms: u64,
    },
    MatrixFinished {
        succeeded: usize,
        failed: usize,
        unsupported: usize,
        duration_ms: u64,
    },
}
