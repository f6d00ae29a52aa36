// src/plan/mod.rs

//! Turns the pipeline config and an environment snapshot into the concrete
//! invocations of each phase.
//!
//! Nothing here runs anything. The runtime asks for a phase's invocations
//! only once the previous phase has succeeded.

pub mod env;

pub use env::BuildEnv;

use crate::config::{BuildSection, PackageSpec, PipelineConfig, ToolSection};
use crate::exec::Invocation;
use crate::types::PhaseKind;

/// Display name of the single Configure invocation.
pub const CONFIGURE_NAME: &str = "Config";

/// Builds invocations for the fixed Configure -> Build -> Package pipeline.
#[derive(Debug, Clone)]
pub struct PipelinePlan {
    tool: ToolSection,
    build: BuildSection,
    packages: Vec<PackageSpec>,
    env: BuildEnv,
}

impl PipelinePlan {
    pub fn new(cfg: &PipelineConfig, env: BuildEnv) -> Self {
        Self {
            tool: cfg.tool.clone(),
            build: cfg.build.clone(),
            packages: cfg.package.clone(),
            env,
        }
    }

    pub fn env(&self) -> &BuildEnv {
        &self.env
    }

    /// Invocations for `phase`, in launch order.
    pub fn phase(&self, phase: PhaseKind) -> Vec<Invocation> {
        match phase {
            PhaseKind::Configure => vec![self.configure()],
            PhaseKind::Build => self.build(),
            PhaseKind::Package => self.package(),
        }
    }

    /// The CMake configure step.
    ///
    /// On Windows the runner hands each argument to the command line as-is,
    /// so values are wrapped in double quotes there to keep generator names
    /// and paths with spaces in one piece. Elsewhere every argument already
    /// reaches the child as its own argv entry and values are left bare.
    pub fn configure(&self) -> Invocation {
        let tool = &self.tool;
        let env = &self.env;

        Invocation::new(
            CONFIGURE_NAME,
            tool.program.as_str(),
            [
                format!("-H{}", tool.source_dir),
                format!("-B{}", tool.build_dir),
                format!("-G{}", quote_value(&env.generator)),
                format!("-T{}", quote_value(&env.toolset)),
                format!("-D{}={}", tool.root_var, quote_value(&env.webrtc_root)),
                format!(
                    "-D{}={}",
                    tool.deps_var,
                    quote_value(&format!("{}/{}", env.deps_path, env.deps_arch))
                ),
                format!(
                    "-DCMAKE_INSTALL_PREFIX={}",
                    quote_value(&tool.install_prefix)
                ),
            ],
        )
    }

    /// One "build and install" invocation per flavor, named after the flavor.
    pub fn build(&self) -> Vec<Invocation> {
        self.build
            .flavors
            .iter()
            .map(|flavor| self.build_invocation(flavor, &self.build.target, flavor))
            .collect()
    }

    /// One invocation per configured package format.
    pub fn package(&self) -> Vec<Invocation> {
        self.packages
            .iter()
            .map(|pkg| self.build_invocation(&pkg.name, &pkg.target, &pkg.flavor))
            .collect()
    }

    /// Extra arguments appended to every Build and Package invocation when
    /// running on the CI agent: `--` then the MSBuild logger registration.
    pub fn ci_suffix(&self) -> Vec<String> {
        if self.env.ci_agent {
            vec![
                "--".to_string(),
                format!("/logger:{}", quote_value(&self.build.ci_logger)),
            ]
        } else {
            Vec::new()
        }
    }

    fn build_invocation(&self, name: &str, target: &str, flavor: &str) -> Invocation {
        let mut args = vec![
            "--build".to_string(),
            self.tool.build_dir.clone(),
            "--target".to_string(),
            target.to_string(),
            "--config".to_string(),
            flavor.to_string(),
        ];
        args.extend(self.ci_suffix());

        Invocation::new(name, self.tool.program.as_str(), args)
    }
}

/// Wrap `value` in double quotes where the runner passes raw command lines.
#[cfg(windows)]
fn quote_value(value: &str) -> String {
    format!("\"{value}\"")
}

#[cfg(not(windows))]
fn quote_value(value: &str) -> String {
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(ci_agent: bool) -> BuildEnv {
        BuildEnv {
            generator: "Visual Studio 15 2017 Win64".to_string(),
            toolset: "host=x64".to_string(),
            webrtc_root: "C:/webrtc".to_string(),
            deps_path: "C:/obs-deps".to_string(),
            deps_arch: "win64".to_string(),
            ci_agent,
        }
    }

    fn plan(ci_agent: bool) -> PipelinePlan {
        PipelinePlan::new(&PipelineConfig::default(), env(ci_agent))
    }

    #[cfg(windows)]
    #[test]
    fn configure_arguments_are_quoted_for_raw_command_lines() {
        let inv = plan(false).configure();
        assert_eq!(inv.name(), "Config");
        assert_eq!(inv.program(), "cmake");
        assert_eq!(
            inv.args(),
            [
                "-H.",
                "-Bbuild",
                "-G\"Visual Studio 15 2017 Win64\"",
                "-T\"host=x64\"",
                "-DWEBRTC_ROOT_DIR=\"C:/webrtc\"",
                "-DDepsPath=\"C:/obs-deps/win64\"",
                "-DCMAKE_INSTALL_PREFIX=\".install\"",
            ]
        );
    }

    #[cfg(not(windows))]
    #[test]
    fn configure_arguments_are_bare_argv_entries() {
        let inv = plan(false).configure();
        assert_eq!(inv.name(), "Config");
        assert_eq!(inv.program(), "cmake");
        assert_eq!(
            inv.args(),
            [
                "-H.",
                "-Bbuild",
                "-GVisual Studio 15 2017 Win64",
                "-Thost=x64",
                "-DWEBRTC_ROOT_DIR=C:/webrtc",
                "-DDepsPath=C:/obs-deps/win64",
                "-DCMAKE_INSTALL_PREFIX=.install",
            ]
        );
        assert!(!inv.args().iter().any(|a| a.contains('"')));
    }

    #[test]
    fn configure_with_empty_env() {
        let plan = PipelinePlan::new(&PipelineConfig::default(), BuildEnv::default());
        let inv = plan.configure();
        assert_eq!(inv.args()[2], format!("-G{}", quote_value("")));
        assert_eq!(inv.args()[5], format!("-DDepsPath={}", quote_value("/")));
    }

    #[test]
    fn build_has_one_invocation_per_flavor() {
        let build = plan(false).build();
        let names: Vec<_> = build.iter().map(Invocation::name).collect();
        assert_eq!(names, ["Debug", "MinSizeRel", "RelWithDebInfo", "Release"]);

        assert_eq!(
            build[1].args(),
            ["--build", "build", "--target", "INSTALL", "--config", "MinSizeRel"]
        );
    }

    #[test]
    fn package_targets_and_flavors() {
        let package = plan(false).package();
        assert_eq!(package.len(), 2);

        assert_eq!(package[0].name(), "7-Zip");
        assert_eq!(
            package[0].args(),
            ["--build", "build", "--target", "PACKAGE_7Z", "--config", "RelWithDebInfo"]
        );
        assert_eq!(package[1].name(), "Zip");
        assert_eq!(
            package[1].args(),
            ["--build", "build", "--target", "PACKAGE_ZIP", "--config", "Release"]
        );
    }

    #[test]
    fn ci_agent_appends_logger_to_build_and_package() {
        let plan = plan(true);
        let logger = format!(
            "/logger:{}",
            quote_value("C:\\Program Files\\AppVeyor\\BuildAgent\\Appveyor.MSBuildLogger.dll")
        );

        for inv in plan.build().iter().chain(plan.package().iter()) {
            let args = inv.args();
            assert_eq!(args.len(), 8, "{}", inv.name());
            assert_eq!(args[6], "--");
            assert_eq!(args[7], logger);
        }

        // Configure never gets the suffix.
        assert!(!plan.configure().args().iter().any(|a| a == "--"));
    }

    #[test]
    fn no_ci_agent_no_suffix() {
        let plan = plan(false);
        assert!(plan.ci_suffix().is_empty());
        for inv in plan.build().iter().chain(plan.package().iter()) {
            assert_eq!(inv.args().len(), 6);
        }
    }

    #[test]
    fn phase_dispatches_to_builders() {
        let plan = plan(false);
        assert_eq!(plan.phase(PhaseKind::Configure), vec![plan.configure()]);
        assert_eq!(plan.phase(PhaseKind::Build), plan.build());
        assert_eq!(plan.phase(PhaseKind::Package), plan.package());
    }
}
