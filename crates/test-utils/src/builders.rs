#![allow(dead_code)]

use buildpipe::config::{PackageSpec, PipelineConfig, RawPipelineConfig};
use buildpipe::plan::BuildEnv;
use buildpipe::types::OnFailure;

/// Builder for `PipelineConfig` to simplify test setup.
pub struct PipelineConfigBuilder {
    config: RawPipelineConfig,
}

impl PipelineConfigBuilder {
    /// Starts from the stock pipeline (four flavors, two packages).
    pub fn new() -> Self {
        Self {
            config: RawPipelineConfig::default(),
        }
    }

    pub fn program(mut self, program: &str) -> Self {
        self.config.tool.program = program.to_string();
        self
    }

    pub fn flavors(mut self, flavors: &[&str]) -> Self {
        self.config.build.flavors = flavors.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn no_packages(mut self) -> Self {
        self.config.package.clear();
        self
    }

    pub fn package(mut self, name: &str, target: &str, flavor: &str) -> Self {
        self.config.package.push(PackageSpec {
            name: name.to_string(),
            target: target.to_string(),
            flavor: flavor.to_string(),
        });
        self
    }

    pub fn on_failure(mut self, on_failure: OnFailure) -> Self {
        self.config.config.on_failure = on_failure;
        self
    }

    pub fn build(self) -> PipelineConfig {
        PipelineConfig::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for PipelineConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Environment snapshot with plausible values and the given CI flag.
pub fn build_env(ci_agent: bool) -> BuildEnv {
    BuildEnv {
        generator: "Visual Studio 15 2017 Win64".to_string(),
        toolset: "host=x64".to_string(),
        webrtc_root: "C:/webrtc".to_string(),
        deps_path: "C:/obs-deps".to_string(),
        deps_arch: "win64".to_string(),
        ci_agent,
    }
}
