// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The phase barrier talks to an `ExecutorBackend` instead of spawning
//! processes directly. This makes it easy to swap in a fake executor in tests
//! while keeping the production implementation in [`ProcessExecutor`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;

use super::invocation::{Invocation, InvocationOutcome};
use super::sink::{SharedSink, StdioSink};

/// Completion of one launched invocation.
pub type Completion = Pin<Box<dyn Future<Output = InvocationOutcome> + Send + 'static>>;

/// Trait abstracting how invocations are executed.
pub trait ExecutorBackend: Send + Sync {
    /// Start `invocation` and return a future resolving to its outcome.
    ///
    /// Implementations must perform the launch side effect (e.g. the OS
    /// spawn) before returning, so that a caller launching a batch in a loop
    /// has started every member before awaiting any of them. When `cancel`
    /// fires, the invocation should be stopped and resolve to
    /// [`InvocationOutcome::Cancelled`].
    fn launch(&self, invocation: &Invocation, cancel: oneshot::Receiver<()>) -> Completion;
}

/// Real executor backend used in production: spawns OS processes and tees
/// their output into a sink.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    sink: SharedSink,
    drain_timeout: Duration,
}

impl ProcessExecutor {
    pub fn new(sink: SharedSink, drain_timeout: Duration) -> Self {
        Self {
            sink,
            drain_timeout,
        }
    }

    /// Executor writing to the orchestrator's own stdout / stderr.
    pub fn stdio(drain_timeout: Duration) -> Self {
        Self::new(Arc::new(StdioSink), drain_timeout)
    }
}

impl ExecutorBackend for ProcessExecutor {
    fn launch(&self, invocation: &Invocation, cancel: oneshot::Receiver<()>) -> Completion {
        let running = invocation.launch(self.sink.clone(), self.drain_timeout);
        Box::pin(running.wait(cancel))
    }
}
