// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`invocation`] is the process runner: one named command, spawned with
//!   `tokio::process::Command`, its output teed with a name prefix.
//! - [`sink`] decides where that prefixed output goes.
//! - [`backend`] provides the `ExecutorBackend` trait and the production
//!   `ProcessExecutor`; tests can replace it with a fake implementation.
//! - [`barrier`] runs one phase: launch all, wait for all.

pub mod backend;
pub mod barrier;
pub mod invocation;
pub mod sink;

pub use backend::{Completion, ExecutorBackend, ProcessExecutor};
pub use barrier::{no_interrupt, PhaseBarrier, PhaseResult};
pub use invocation::{
    outcome_from_status, Invocation, InvocationOutcome, RunningProcess, DEFAULT_DRAIN_TIMEOUT,
    SPAWN_FAILURE_CODE,
};
pub use sink::{MemorySink, OutputSink, SharedSink, StdioSink, StreamKind};
