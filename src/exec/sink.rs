// src/exec/sink.rs

//! Where child output ends up.
//!
//! Every chunk read from a child pipe is handed to an [`OutputSink`] together
//! with the invocation name and the stream it came from. Production code uses
//! [`StdioSink`]; tests use [`MemorySink`] to inspect what would have been
//! printed.

use std::fmt::Debug;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard};

/// Which child stream a chunk was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl StreamKind {
    /// Tag used inside the output prefix.
    pub fn tag(self) -> &'static str {
        match self {
            StreamKind::Stdout => "Out",
            StreamKind::Stderr => "Err",
        }
    }
}

/// `[<name>:Out] ` / `[<name>:Err] `.
pub fn prefix(name: &str, stream: StreamKind) -> String {
    format!("[{}:{}] ", name, stream.tag())
}

/// Build the bytes written for one chunk: prefix followed by the raw chunk.
fn prefixed_chunk(name: &str, stream: StreamKind, chunk: &[u8]) -> Vec<u8> {
    let prefix = prefix(name, stream);
    let mut out = Vec::with_capacity(prefix.len() + chunk.len());
    out.extend_from_slice(prefix.as_bytes());
    out.extend_from_slice(chunk);
    out
}

/// Destination for prefixed child output.
pub trait OutputSink: Send + Sync + Debug {
    /// Write one chunk exactly as received, prefixed with the invocation name
    /// and stream tag. No line buffering is applied.
    fn write_chunk(&self, stream: StreamKind, name: &str, chunk: &[u8]) -> io::Result<()>;
}

/// Shared handle used by concurrently running invocations.
pub type SharedSink = Arc<dyn OutputSink>;

/// Writes stdout chunks to the process stdout and stderr chunks to the
/// process stderr.
///
/// Each prefixed chunk is written with a single `write_all` under the stream
/// lock, so chunks from concurrent children interleave but never tear.
#[derive(Debug, Clone, Default)]
pub struct StdioSink;

impl OutputSink for StdioSink {
    fn write_chunk(&self, stream: StreamKind, name: &str, chunk: &[u8]) -> io::Result<()> {
        let bytes = prefixed_chunk(name, stream, chunk);
        match stream {
            StreamKind::Stdout => {
                let mut out = io::stdout().lock();
                out.write_all(&bytes)?;
                out.flush()
            }
            StreamKind::Stderr => {
                let mut err = io::stderr().lock();
                err.write_all(&bytes)?;
                err.flush()
            }
        }
    }
}

/// In-memory sink capturing both streams.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    stdout: Arc<Mutex<Vec<u8>>>,
    stderr: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stdout_bytes(&self) -> Vec<u8> {
        lock(&self.stdout).clone()
    }

    pub fn stderr_bytes(&self) -> Vec<u8> {
        lock(&self.stderr).clone()
    }

    pub fn stdout_string(&self) -> String {
        String::from_utf8_lossy(&self.stdout_bytes()).into_owned()
    }

    pub fn stderr_string(&self) -> String {
        String::from_utf8_lossy(&self.stderr_bytes()).into_owned()
    }
}

impl OutputSink for MemorySink {
    fn write_chunk(&self, stream: StreamKind, name: &str, chunk: &[u8]) -> io::Result<()> {
        let bytes = prefixed_chunk(name, stream, chunk);
        let target = match stream {
            StreamKind::Stdout => &self.stdout,
            StreamKind::Stderr => &self.stderr,
        };
        lock(target).extend_from_slice(&bytes);
        Ok(())
    }
}

// A panicking writer must not take the captured output down with it.
fn lock(buf: &Mutex<Vec<u8>>) -> MutexGuard<'_, Vec<u8>> {
    buf.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
