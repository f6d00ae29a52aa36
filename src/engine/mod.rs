// src/engine/mod.rs

//! Orchestration engine for buildpipe.
//!
//! The pure core state machine lives in [`core`]; the async/IO shell that
//! launches phases through an executor is implemented in [`runtime`].

use crate::exec::PhaseResult;
use crate::types::PhaseKind;

/// Exit code used when the run was interrupted with Ctrl-C.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Final result of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// Every phase succeeded.
    Succeeded,
    /// A phase failed; `code` is the failing invocation's exit code.
    Failed {
        phase: PhaseKind,
        /// `None` when the phase was interrupted rather than failed.
        invocation: Option<String>,
        code: i32,
    },
}

impl PipelineOutcome {
    /// Process exit code for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineOutcome::Succeeded => 0,
            PipelineOutcome::Failed { code, .. } => *code,
        }
    }
}

/// Events flowing into the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeEvent {
    /// The run begins.
    Started,
    /// Every invocation of `phase` has settled.
    PhaseFinished { phase: PhaseKind, result: PhaseResult },
}

pub mod core;
pub mod runtime;

pub use core::{CoreCommand, CoreRuntime, CoreStep, PipelineState};
pub use runtime::Runtime;
