// src/exec/barrier.rs

//! Join barrier for one phase.
//!
//! Every invocation of the phase is launched before the barrier awaits
//! anything. Each completion is reported over an mpsc channel, and the barrier
//! returns only once every member has settled. A phase succeeds iff every
//! member succeeded.

use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use crate::types::{OnFailure, PhaseKind};

use super::backend::ExecutorBackend;
use super::invocation::{Invocation, InvocationOutcome};

/// Aggregate result of one phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseResult {
    /// Every invocation exited with code 0.
    Succeeded,
    /// The first invocation to fail, and its exit code.
    Failed { invocation: String, code: i32 },
    /// The orchestrator was interrupted (Ctrl-C) while the phase ran.
    Interrupted,
}

impl PhaseResult {
    pub fn is_success(&self) -> bool {
        matches!(self, PhaseResult::Succeeded)
    }
}

/// A receiver that never reports an interrupt.
pub fn no_interrupt() -> watch::Receiver<bool> {
    watch::channel(false).1
}

/// One member reporting back to the barrier.
struct Settled {
    idx: usize,
    name: String,
    outcome: InvocationOutcome,
}

/// Launches a phase's invocations concurrently and waits for all of them.
pub struct PhaseBarrier<'a, E: ExecutorBackend + ?Sized> {
    executor: &'a E,
    on_failure: OnFailure,
}

impl<'a, E: ExecutorBackend + ?Sized> PhaseBarrier<'a, E> {
    pub fn new(executor: &'a E, on_failure: OnFailure) -> Self {
        Self {
            executor,
            on_failure,
        }
    }

    /// Run every invocation of `phase` and wait until all have settled.
    ///
    /// - With [`OnFailure::Cancel`], the first failure cancels every sibling
    ///   still running; the barrier still waits for them to settle.
    /// - With [`OnFailure::Wait`], siblings run to completion.
    ///
    /// In both modes the reported failure is the first one to settle.
    /// Setting `interrupt` to `true` cancels every running member and yields
    /// [`PhaseResult::Interrupted`].
    pub async fn run(
        &self,
        phase: PhaseKind,
        invocations: Vec<Invocation>,
        interrupt: &mut watch::Receiver<bool>,
    ) -> PhaseResult {
        if invocations.is_empty() {
            info!(%phase, "phase has no invocations; nothing to do");
            return PhaseResult::Succeeded;
        }

        let names: Vec<_> = invocations.iter().map(Invocation::name).collect();
        info!(%phase, ?names, "launching phase");

        let (done_tx, mut done_rx) = mpsc::channel::<Settled>(invocations.len());
        let mut cancels: HashMap<usize, oneshot::Sender<()>> = HashMap::new();

        for (idx, invocation) in invocations.iter().enumerate() {
            let (cancel_tx, cancel_rx) = oneshot::channel();
            let completion = self.executor.launch(invocation, cancel_rx);
            cancels.insert(idx, cancel_tx);

            let tx = done_tx.clone();
            let name = invocation.name().to_string();
            tokio::spawn(async move {
                let outcome = completion.await;
                let _ = tx.send(Settled { idx, name, outcome }).await;
            });
        }
        drop(done_tx);

        let mut first_failure: Option<(String, i32)> = None;
        let mut interrupted = false;
        let mut listen_interrupt = true;

        loop {
            tokio::select! {
                settled = done_rx.recv() => {
                    let Some(settled) = settled else { break };
                    cancels.remove(&settled.idx);

                    match settled.outcome {
                        InvocationOutcome::Success => {
                            debug!(%phase, invocation = %settled.name, "invocation succeeded");
                        }
                        InvocationOutcome::Failed(code) => {
                            warn!(
                                %phase,
                                invocation = %settled.name,
                                exit_code = code,
                                "invocation failed"
                            );
                            if first_failure.is_none() {
                                first_failure = Some((settled.name, code));
                                if self.on_failure == OnFailure::Cancel {
                                    cancel_running(phase, &mut cancels);
                                }
                            }
                        }
                        InvocationOutcome::Cancelled => {
                            debug!(%phase, invocation = %settled.name, "invocation cancelled");
                        }
                    }
                }

                changed = interrupt.changed(), if listen_interrupt => {
                    match changed {
                        Ok(()) if *interrupt.borrow() => {
                            warn!(%phase, "interrupt received; cancelling phase");
                            interrupted = true;
                            listen_interrupt = false;
                            cancel_running(phase, &mut cancels);
                        }
                        Ok(()) => {}
                        // Sender gone: no interrupt can arrive any more.
                        Err(_) => listen_interrupt = false,
                    }
                }
            }
        }

        let result = if interrupted {
            PhaseResult::Interrupted
        } else if let Some((invocation, code)) = first_failure {
            PhaseResult::Failed { invocation, code }
        } else {
            PhaseResult::Succeeded
        };

        info!(%phase, ?result, "phase settled");
        result
    }
}

fn cancel_running(phase: PhaseKind, cancels: &mut HashMap<usize, oneshot::Sender<()>>) {
    if cancels.is_empty() {
        return;
    }
    info!(%phase, count = cancels.len(), "cancelling running invocations");
    for (_, cancel) in cancels.drain() {
        // Already finished members have dropped their receiver.
        let _ = cancel.send(());
    }
}
