// src/logging.rs

//! Orchestrator logging on stderr.
//!
//! Log lines share stderr with the children's `[<name>:Err] ` chunks, so they
//! use their own shape: `buildpipe: <LEVEL> <message> <fields>`. A log line
//! never starts with `[`, which keeps it apart from child output:
//!
//! ```text
//! buildpipe:  INFO launching phase phase=build names=["Debug", "Release"]
//! [Debug:Err] cl : warning D9025: overriding '/W3' with '/W4'
//! buildpipe:  WARN invocation failed phase=build invocation="Debug" exit_code=2
//! ```
//!
//! Filter selection:
//! 1. `--log-level` sets one level for every target
//! 2. `BUILDPIPE_LOG` holds `EnvFilter` directives, e.g.
//!    `warn,buildpipe::exec=debug`
//! 3. `info`

use std::fmt::Write as _;

use anyhow::{anyhow, Result};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

use crate::cli::LogLevel;

/// Environment variable holding filter directives.
pub const LOG_ENV_VAR: &str = "BUILDPIPE_LOG";

/// First token of every orchestrator log line.
pub const LOG_LINE_PREFIX: &str = "buildpipe:";

const DEFAULT_DIRECTIVE: &str = "info";

/// Install the global subscriber. Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env_value = std::env::var(LOG_ENV_VAR).ok();
    let filter = build_filter(cli_level, env_value.as_deref());

    tracing_subscriber::fmt()
        .event_format(LogLineFormat)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to install log subscriber: {e}"))
}

/// Filter for the given CLI level and `BUILDPIPE_LOG` value.
///
/// Unparsable directives fall back to `info` rather than silencing the run.
pub fn build_filter(cli_level: Option<LogLevel>, env_value: Option<&str>) -> EnvFilter {
    if let Some(level) = cli_level {
        return EnvFilter::new(directive(level));
    }

    env_value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| EnvFilter::try_new(s).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVE))
}

fn directive(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}

/// `buildpipe: <LEVEL> <message> <fields>`, one event per line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogLineFormat;

impl<S, N> FormatEvent<S, N> for LogLineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let level = event.metadata().level().to_string();
        write!(writer, "{LOG_LINE_PREFIX} {level:>5} ")?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
