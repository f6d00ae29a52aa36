// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod plan;
pub mod types;

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{resolve_config, PipelineConfig};
use crate::engine::{CoreRuntime, PipelineOutcome, Runtime};
use crate::exec::ProcessExecutor;
use crate::plan::{BuildEnv, PipelinePlan};
use crate::types::PhaseKind;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the environment snapshot and phase plan
/// - the process executor
/// - the core runtime and its IO shell
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<PipelineOutcome> {
    let cfg = resolve_config(args.config.as_deref().map(Path::new))?;

    // Read once, before the Configure invocation is built.
    let env = BuildEnv::from_env(&cfg.env);
    let plan = PipelinePlan::new(&cfg, env);

    if args.dry_run {
        print_dry_run(&cfg, &plan);
        return Ok(PipelineOutcome::Succeeded);
    }

    // Ctrl-C → cancel the running phase.
    let (interrupt_tx, interrupt_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("failed to listen for Ctrl+C: {e}");
            return;
        }
        let _ = interrupt_tx.send(true);
    });

    info!(
        program = %cfg.tool.program,
        build_dir = %cfg.tool.build_dir,
        on_failure = ?cfg.config.on_failure,
        ci_agent = plan.env().ci_agent,
        "starting pipeline"
    );

    let executor = ProcessExecutor::stdio(Duration::from_millis(cfg.config.drain_timeout_ms));
    let runtime = Runtime::new(
        CoreRuntime::new(),
        plan,
        executor,
        cfg.config.on_failure,
        interrupt_rx,
    );

    Ok(runtime.run().await?)
}

/// Simple dry-run output: every phase's invocations, assuming each earlier
/// phase succeeds.
fn print_dry_run(cfg: &PipelineConfig, plan: &PipelinePlan) {
    println!("buildpipe dry-run");
    println!("  config.on_failure = {:?}", cfg.config.on_failure);
    println!("  config.drain_timeout_ms = {}", cfg.config.drain_timeout_ms);
    println!("  ci_agent = {}", plan.env().ci_agent);

    for phase in [PhaseKind::Configure, PhaseKind::Build, PhaseKind::Package] {
        let invocations = plan.phase(phase);
        println!();
        println!("{phase} ({}):", invocations.len());
        for inv in invocations {
            println!("  - {}", inv.name());
            println!("      program: {}", inv.program());
            println!("      args: {:?}", inv.args());
        }
    }

    debug!("dry-run complete (no execution)");
}
