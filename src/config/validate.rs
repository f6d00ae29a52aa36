// src/config/validate.rs

use crate::config::model::{PipelineConfig, RawPipelineConfig};
use crate::errors::{BuildpipeError, Result};

/// Upper bound for `[config].drain_timeout_ms`.
pub const MAX_DRAIN_TIMEOUT_MS: u64 = 60_000;

impl TryFrom<RawPipelineConfig> for PipelineConfig {
    type Error = crate::errors::BuildpipeError;

    fn try_from(raw: RawPipelineConfig) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(PipelineConfig::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawPipelineConfig) -> Result<()> {
    validate_global_config(cfg)?;
    validate_tool(cfg)?;
    validate_build(cfg)?;
    validate_packages(cfg)?;
    Ok(())
}

fn config_error(msg: impl Into<String>) -> BuildpipeError {
    BuildpipeError::ConfigError(msg.into())
}

fn validate_global_config(cfg: &RawPipelineConfig) -> Result<()> {
    if cfg.config.drain_timeout_ms > MAX_DRAIN_TIMEOUT_MS {
        return Err(config_error(format!(
            "[config].drain_timeout_ms must be <= {} (got {})",
            MAX_DRAIN_TIMEOUT_MS, cfg.config.drain_timeout_ms
        )));
    }
    Ok(())
}

fn validate_tool(cfg: &RawPipelineConfig) -> Result<()> {
    if cfg.tool.program.trim().is_empty() {
        return Err(config_error("[tool].program must not be empty"));
    }
    if cfg.tool.build_dir.trim().is_empty() {
        return Err(config_error("[tool].build_dir must not be empty"));
    }
    Ok(())
}

fn validate_build(cfg: &RawPipelineConfig) -> Result<()> {
    if cfg.build.flavors.is_empty() {
        return Err(config_error("[build].flavors must list at least one flavor"));
    }
    if cfg.build.flavors.iter().any(|f| f.trim().is_empty()) {
        return Err(config_error("[build].flavors must not contain empty names"));
    }
    Ok(())
}

fn validate_packages(cfg: &RawPipelineConfig) -> Result<()> {
    for (idx, pkg) in cfg.package.iter().enumerate() {
        for (field, value) in [
            ("name", &pkg.name),
            ("target", &pkg.target),
            ("flavor", &pkg.flavor),
        ] {
            if value.trim().is_empty() {
                return Err(config_error(format!(
                    "[[package]] #{} has an empty `{}`",
                    idx + 1,
                    field
                )));
            }
        }
    }
    Ok(())
}
