// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! `Start -> Configuring -> {Building | Failed} -> {Packaging | Failed} ->
//! {Done | Failed}`
//!
//! The core consumes [`RuntimeEvent`]s and produces:
//! - an updated state
//! - a list of commands describing what the IO shell should do next
//!
//! It has no channels, no Tokio types, and performs no IO.

use tracing::{info, warn};

use crate::engine::{INTERRUPTED_EXIT_CODE, PipelineOutcome, RuntimeEvent};
use crate::exec::PhaseResult;
use crate::types::PhaseKind;

/// Where the pipeline currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Start,
    Configuring,
    Building,
    Packaging,
    Done,
    Failed(i32),
}

impl PipelineState {
    fn running(phase: PhaseKind) -> Self {
        match phase {
            PhaseKind::Configure => PipelineState::Configuring,
            PhaseKind::Build => PipelineState::Building,
            PhaseKind::Package => PipelineState::Packaging,
        }
    }

    /// The phase currently in flight, if any.
    pub fn phase(self) -> Option<PhaseKind> {
        match self {
            PipelineState::Configuring => Some(PhaseKind::Configure),
            PipelineState::Building => Some(PhaseKind::Build),
            PipelineState::Packaging => Some(PhaseKind::Package),
            PipelineState::Start | PipelineState::Done | PipelineState::Failed(_) => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed(_))
    }
}

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Build this phase's invocations, launch them all and report back with
    /// `RuntimeEvent::PhaseFinished`.
    LaunchPhase(PhaseKind),
    /// Stop with this outcome.
    Exit(PipelineOutcome),
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    fn idle(keep_running: bool) -> Self {
        Self {
            commands: Vec::new(),
            keep_running,
        }
    }
}

#[derive(Debug)]
pub struct CoreRuntime {
    state: PipelineState,
    outcome: Option<PipelineOutcome>,
}

impl Default for CoreRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl CoreRuntime {
    pub fn new() -> Self {
        Self {
            state: PipelineState::Start,
            outcome: None,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Final outcome once a terminal state was reached.
    pub fn outcome(&self) -> Option<&PipelineOutcome> {
        self.outcome.as_ref()
    }

    /// Handle a single runtime event, updating state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::Started => self.handle_started(),
            RuntimeEvent::PhaseFinished { phase, result } => {
                self.handle_phase_finished(phase, result)
            }
        }
    }

    fn handle_started(&mut self) -> CoreStep {
        if self.state != PipelineState::Start {
            warn!(state = ?self.state, "ignoring duplicate start");
            return CoreStep::idle(!self.state.is_terminal());
        }
        self.launch(PhaseKind::Configure)
    }

    fn handle_phase_finished(&mut self, phase: PhaseKind, result: PhaseResult) -> CoreStep {
        if self.state.phase() != Some(phase) {
            warn!(
                %phase,
                state = ?self.state,
                "ignoring result for a phase that is not running"
            );
            return CoreStep::idle(!self.state.is_terminal());
        }

        match result {
            PhaseResult::Succeeded => match phase.next() {
                Some(next) => self.launch(next),
                None => {
                    info!("all phases succeeded");
                    self.finish(PipelineState::Done, PipelineOutcome::Succeeded)
                }
            },
            PhaseResult::Failed { invocation, code } => {
                warn!(%phase, %invocation, exit_code = code, "phase failed; aborting pipeline");
                self.finish(
                    PipelineState::Failed(code),
                    PipelineOutcome::Failed {
                        phase,
                        invocation: Some(invocation),
                        code,
                    },
                )
            }
            PhaseResult::Interrupted => {
                warn!(%phase, "phase interrupted; aborting pipeline");
                self.finish(
                    PipelineState::Failed(INTERRUPTED_EXIT_CODE),
                    PipelineOutcome::Failed {
                        phase,
                        invocation: None,
                        code: INTERRUPTED_EXIT_CODE,
                    },
                )
            }
        }
    }

    fn launch(&mut self, phase: PhaseKind) -> CoreStep {
        info!(%phase, "entering phase");
        self.state = PipelineState::running(phase);
        CoreStep {
            commands: vec![CoreCommand::LaunchPhase(phase)],
            keep_running: true,
        }
    }

    fn finish(&mut self, state: PipelineState, outcome: PipelineOutcome) -> CoreStep {
        self.state = state;
        self.outcome = Some(outcome.clone());
        CoreStep {
            commands: vec![CoreCommand::Exit(outcome)],
            keep_running: false,
        }
    }
}
