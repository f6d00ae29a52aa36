use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::oneshot;
use buildpipe::exec::{Completion, ExecutorBackend, Invocation, InvocationOutcome};

/// What the fake executor observed, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecEvent {
    Launched(String),
    Resolved(String, InvocationOutcome),
}

/// A fake executor that:
/// - records every launched invocation (synchronously, inside `launch`)
/// - resolves each one after a scripted delay with a scripted exit code
///   (default: immediately, code 0)
/// - honours cancellation by resolving to `Cancelled`.
#[derive(Debug, Clone, Default)]
pub struct FakeExecutor {
    codes: HashMap<String, i32>,
    delays: HashMap<String, Duration>,
    default_delay: Duration,
    events: Arc<Mutex<Vec<ExecEvent>>>,
    launched: Arc<Mutex<Vec<Invocation>>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invocations named `name` exit with `code`.
    pub fn exit_code(mut self, name: &str, code: i32) -> Self {
        self.codes.insert(name.to_string(), code);
        self
    }

    /// Invocations named `name` take `delay` to finish.
    pub fn delay(mut self, name: &str, delay: Duration) -> Self {
        self.delays.insert(name.to_string(), delay);
        self
    }

    pub fn default_delay(mut self, delay: Duration) -> Self {
        self.default_delay = delay;
        self
    }

    pub fn events(&self) -> Vec<ExecEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn launched(&self) -> Vec<Invocation> {
        self.launched.lock().unwrap().clone()
    }

    pub fn launched_names(&self) -> Vec<String> {
        self.launched()
            .iter()
            .map(|inv| inv.name().to_string())
            .collect()
    }

    /// Position of the first event matching `pred`.
    pub fn position<P>(&self, pred: P) -> Option<usize>
    where
        P: Fn(&ExecEvent) -> bool,
    {
        self.events().iter().position(pred)
    }
}

impl ExecutorBackend for FakeExecutor {
    fn launch(&self, invocation: &Invocation, cancel: oneshot::Receiver<()>) -> Completion {
        let name = invocation.name().to_string();
        self.events
            .lock()
            .unwrap()
            .push(ExecEvent::Launched(name.clone()));
        self.launched.lock().unwrap().push(invocation.clone());

        let code = self.codes.get(&name).copied().unwrap_or(0);
        let delay = self.delays.get(&name).copied().unwrap_or(self.default_delay);
        let events = Arc::clone(&self.events);

        Box::pin(async move {
            let cancelled = async {
                match cancel.await {
                    Ok(()) => (),
                    // Sender dropped without cancelling: never fires.
                    Err(_) => std::future::pending::<()>().await,
                }
            };

            let outcome = tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    if code == 0 {
                        InvocationOutcome::Success
                    } else {
                        InvocationOutcome::Failed(code)
                    }
                }
                _ = cancelled => InvocationOutcome::Cancelled,
            };

            events
                .lock()
                .unwrap()
                .push(ExecEvent::Resolved(name, outcome));
            outcome
        })
    }
}
