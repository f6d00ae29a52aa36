// src/engine/runtime.rs

use std::fmt;

use anyhow::anyhow;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::errors::Result;
use crate::exec::{ExecutorBackend, PhaseBarrier, PhaseResult};
use crate::plan::PipelinePlan;
use crate::types::{OnFailure, PhaseKind};

use super::core::{CoreCommand, CoreRuntime};
use super::{PipelineOutcome, RuntimeEvent};

/// Drives the pipeline core and delegates phase execution to an
/// `ExecutorBackend`.
///
/// All semantics live in `CoreRuntime`; this shell only builds each phase's
/// invocations when the core asks for the phase, runs them through the
/// barrier and feeds the result back.
pub struct Runtime<E: ExecutorBackend> {
    core: CoreRuntime,
    plan: PipelinePlan,
    executor: E,
    on_failure: OnFailure,
    interrupt: watch::Receiver<bool>,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("on_failure", &self.on_failure)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(
        core: CoreRuntime,
        plan: PipelinePlan,
        executor: E,
        on_failure: OnFailure,
        interrupt: watch::Receiver<bool>,
    ) -> Self {
        Self {
            core,
            plan,
            executor,
            on_failure,
            interrupt,
        }
    }

    /// Run the pipeline to a terminal state.
    pub async fn run(mut self) -> Result<PipelineOutcome> {
        info!("buildpipe runtime started");

        let mut event = RuntimeEvent::Started;
        loop {
            debug!(?event, "runtime received event");
            let step = self.core.step(event);

            let mut next = None;
            for command in step.commands {
                match command {
                    CoreCommand::LaunchPhase(phase) => {
                        next = Some(self.run_phase(phase).await);
                    }
                    CoreCommand::Exit(outcome) => {
                        info!(?outcome, exit_code = outcome.exit_code(), "pipeline finished");
                        return Ok(outcome);
                    }
                }
            }

            match next {
                Some(e) if step.keep_running => event = e,
                _ => break,
            }
        }

        Err(anyhow!(
            "pipeline stopped in state {:?} without an outcome",
            self.core.state()
        )
        .into())
    }

    async fn run_phase(&mut self, phase: PhaseKind) -> RuntimeEvent {
        let result = if *self.interrupt.borrow() {
            PhaseResult::Interrupted
        } else {
            // Constructed only now: the previous phase has already succeeded.
            let invocations = self.plan.phase(phase);
            let barrier = PhaseBarrier::new(&self.executor, self.on_failure);
            barrier.run(phase, invocations, &mut self.interrupt).await
        };

        RuntimeEvent::PhaseFinished { phase, result }
    }
}
