// src/exec/invocation.rs

//! A single named external command and its running process.
//!
//! [`Invocation`] is the immutable description (name, program, arguments).
//! [`Invocation::launch`] spawns the OS process right away and returns a
//! [`RunningProcess`], whose [`RunningProcess::wait`] resolves exactly once to
//! an [`InvocationOutcome`]. [`Invocation::execute`] chains the two for
//! callers that never cancel.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::sink::{SharedSink, StreamKind};

/// Exit code reported when the program could not be started at all.
pub const SPAWN_FAILURE_CODE: i32 = 127;

/// How long to wait for output pipes to hit EOF after the child exited.
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_millis(2000);

const PUMP_BUFFER_SIZE: usize = 8 * 1024;

/// Outcome of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationOutcome {
    /// Exit code 0.
    Success,
    /// Non-zero exit code, or a synthetic code for signal / spawn failures.
    Failed(i32),
    /// Killed by the orchestrator before it finished.
    Cancelled,
}

impl InvocationOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, InvocationOutcome::Success)
    }

    /// Exit code this outcome stands for; `None` for cancelled runs.
    pub fn exit_code(self) -> Option<i32> {
        match self {
            InvocationOutcome::Success => Some(0),
            InvocationOutcome::Failed(code) => Some(code),
            InvocationOutcome::Cancelled => None,
        }
    }
}

/// Map an OS exit status onto an outcome.
///
/// Signal termination (no exit code) becomes `Failed(128 + signal)`, the
/// shell convention; anything else without a code becomes `Failed(1)`.
pub fn outcome_from_status(status: ExitStatus) -> InvocationOutcome {
    match status.code() {
        Some(0) => InvocationOutcome::Success,
        Some(code) => InvocationOutcome::Failed(code),
        None => InvocationOutcome::Failed(signal_exit_code(status)),
    }
}

#[cfg(unix)]
fn signal_exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status.signal().map(|sig| 128 + sig).unwrap_or(1)
}

#[cfg(not(unix))]
fn signal_exit_code(_status: ExitStatus) -> i32 {
    1
}

/// Named description of one external command execution.
///
/// The name is only used to prefix output and tag logs; it need not be
/// unique. Arguments reach the OS verbatim, with no shell in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    name: String,
    program: String,
    args: Vec<String>,
}

impl Invocation {
    pub fn new<I, S>(name: impl Into<String>, program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);

        // Pass arguments through untouched so values like `-G"Visual Studio 15"`
        // keep their embedded quotes, and keep the console window hidden.
        #[cfg(windows)]
        {
            const CREATE_NO_WINDOW: u32 = 0x0800_0000;
            for arg in &self.args {
                cmd.raw_arg(arg);
            }
            cmd.creation_flags(CREATE_NO_WINDOW);
        }
        #[cfg(not(windows))]
        cmd.args(&self.args);

        // Each child leads its own process group so a cancel reaches the
        // tools it starts, not just the child itself.
        #[cfg(unix)]
        cmd.process_group(0);

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// Spawn the process and start pumping its output into `sink`.
    ///
    /// The OS spawn has happened by the time this returns. A spawn error is
    /// logged and yields a process that resolves to
    /// `Failed(SPAWN_FAILURE_CODE)`.
    pub fn launch(&self, sink: SharedSink, drain_timeout: Duration) -> RunningProcess {
        info!(
            invocation = %self.name,
            program = %self.program,
            args = ?self.args,
            "starting process"
        );

        let mut child = match self.command().spawn() {
            Ok(child) => child,
            Err(e) => {
                error!(
                    invocation = %self.name,
                    program = %self.program,
                    error = %e,
                    "failed to spawn process"
                );
                return RunningProcess {
                    name: self.name.clone(),
                    child: None,
                    pumps: Vec::new(),
                    drain_timeout,
                };
            }
        };

        let mut pumps = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            pumps.push(spawn_pump(
                stdout,
                StreamKind::Stdout,
                self.name.clone(),
                sink.clone(),
            ));
        }
        if let Some(stderr) = child.stderr.take() {
            pumps.push(spawn_pump(stderr, StreamKind::Stderr, self.name.clone(), sink));
        }

        RunningProcess {
            name: self.name.clone(),
            child: Some(child),
            pumps,
            drain_timeout,
        }
    }

    /// Launch and wait without any way to cancel.
    pub async fn execute(&self, sink: SharedSink) -> InvocationOutcome {
        let (_cancel_tx, cancel_rx) = oneshot::channel();
        self.launch(sink, DEFAULT_DRAIN_TIMEOUT).wait(cancel_rx).await
    }
}

/// The OS process bound to one invocation, plus its output pumps.
#[derive(Debug)]
pub struct RunningProcess {
    name: String,
    /// `None` when the spawn failed.
    child: Option<Child>,
    pumps: Vec<JoinHandle<()>>,
    drain_timeout: Duration,
}

impl RunningProcess {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// OS process id, if the process was spawned and has not been reaped.
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(Child::id)
    }

    /// Wait for the process to exit, or kill it when `cancel` fires.
    ///
    /// Dropping the cancel sender without sending does not cancel; the
    /// process is then simply awaited.
    pub async fn wait(self, mut cancel: oneshot::Receiver<()>) -> InvocationOutcome {
        let RunningProcess {
            name,
            child,
            pumps,
            drain_timeout,
        } = self;

        let Some(mut child) = child else {
            return InvocationOutcome::Failed(SPAWN_FAILURE_CODE);
        };

        let status = tokio::select! {
            status = child.wait() => status,

            cancel = &mut cancel => {
                match cancel {
                    Ok(()) => {
                        info!(invocation = %name, "cancellation requested; killing process tree");
                        kill_process_tree(&name, &mut child).await;
                        drain_output(&name, pumps, drain_timeout).await;
                        return InvocationOutcome::Cancelled;
                    }
                    Err(_) => {
                        debug!(
                            invocation = %name,
                            "cancel channel closed without explicit cancellation"
                        );
                        child.wait().await
                    }
                }
            }
        };

        drain_output(&name, pumps, drain_timeout).await;

        match status {
            Ok(status) => {
                let outcome = outcome_from_status(status);
                info!(
                    invocation = %name,
                    exit_code = ?outcome.exit_code(),
                    success = outcome.is_success(),
                    "process exited"
                );
                outcome
            }
            Err(e) => {
                error!(invocation = %name, error = %e, "waiting for process failed");
                InvocationOutcome::Failed(1)
            }
        }
    }
}

/// Kill the child together with every process it started, then reap it.
///
/// On Unix the child is the leader of its own process group, so the whole
/// group gets `SIGKILL`. On Windows `taskkill /T` walks the process tree.
async fn kill_process_tree(name: &str, child: &mut Child) {
    if let Some(pid) = child.id() {
        #[cfg(unix)]
        {
            // SAFETY: plain syscall on a pid we spawned and have not reaped.
            let rc = unsafe { libc::killpg(pid as libc::pid_t, libc::SIGKILL) };
            if rc != 0 {
                warn!(
                    invocation = %name,
                    pgid = pid,
                    error = %std::io::Error::last_os_error(),
                    "failed to kill process group"
                );
            }
        }

        #[cfg(windows)]
        {
            let status = Command::new("taskkill")
                .args(["/T", "/F", "/PID", &pid.to_string()])
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .await;
            match status {
                Ok(status) if status.success() => {}
                Ok(status) => {
                    warn!(invocation = %name, pid, ?status, "taskkill did not succeed")
                }
                Err(e) => warn!(invocation = %name, pid, error = %e, "failed to run taskkill"),
            }
        }
    }

    // Covers the direct child when the tree kill missed it, and reaps it.
    if let Err(e) = child.kill().await {
        warn!(
            invocation = %name,
            error = %e,
            "failed to kill child process on cancellation"
        );
    }
}

/// Copy one child pipe into the sink chunk by chunk until EOF.
fn spawn_pump<R>(mut reader: R, stream: StreamKind, name: String, sink: SharedSink) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = vec![0u8; PUMP_BUFFER_SIZE];
        loop {
            match reader.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    // Keep reading even if the sink is gone, so the child
                    // never blocks on a full pipe.
                    if let Err(e) = sink.write_chunk(stream, &name, &buf[..n]) {
                        debug!(invocation = %name, ?stream, error = %e, "dropping output chunk");
                    }
                }
                Err(e) => {
                    debug!(invocation = %name, ?stream, error = %e, "output pipe read failed");
                    break;
                }
            }
        }
    })
}

async fn drain_output(name: &str, pumps: Vec<JoinHandle<()>>, limit: Duration) {
    let joined = tokio::time::timeout(limit, async move {
        for pump in pumps {
            let _ = pump.await;
        }
    })
    .await;

    if joined.is_err() {
        warn!(
            invocation = %name,
            timeout_ms = limit.as_millis() as u64,
            "output pipes still open after exit; not waiting any longer"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invocation_keeps_args_in_order() {
        let inv = Invocation::new("Debug", "cmake", ["--build", "build", "--config", "Debug"]);
        assert_eq!(inv.name(), "Debug");
        assert_eq!(inv.program(), "cmake");
        assert_eq!(inv.args(), ["--build", "build", "--config", "Debug"]);
    }

    #[test]
    fn outcome_codes() {
        assert_eq!(InvocationOutcome::Success.exit_code(), Some(0));
        assert_eq!(InvocationOutcome::Failed(2).exit_code(), Some(2));
        assert_eq!(InvocationOutcome::Cancelled.exit_code(), None);
        assert!(!InvocationOutcome::Failed(2).is_success());
    }

    #[cfg(unix)]
    #[test]
    fn status_mapping_on_unix() {
        use std::os::unix::process::ExitStatusExt;

        assert_eq!(
            outcome_from_status(ExitStatus::from_raw(0)),
            InvocationOutcome::Success
        );
        // Raw wait status: exit code lives in the high byte.
        assert_eq!(
            outcome_from_status(ExitStatus::from_raw(2 << 8)),
            InvocationOutcome::Failed(2)
        );
        // Killed by SIGKILL.
        assert_eq!(
            outcome_from_status(ExitStatus::from_raw(9)),
            InvocationOutcome::Failed(137)
        );
    }
}
