// src/config/model.rs

use serde::Deserialize;

use crate::types::OnFailure;

/// Pipeline configuration as read from a TOML file.
///
/// ```toml
/// [config]
/// on_failure = "cancel"
///
/// [tool]
/// program = "cmake"
/// build_dir = "build"
///
/// [build]
/// flavors = ["Debug", "Release"]
///
/// [[package]]
/// name = "Zip"
/// target = "PACKAGE_ZIP"
/// flavor = "Release"
/// ```
///
/// All sections are optional. The defaults reproduce the stock pipeline:
/// CMake configure, four build flavors, 7z + zip packages.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPipelineConfig {
    /// Global behaviour from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// Build tool invocation details from `[tool]`.
    #[serde(default)]
    pub tool: ToolSection,

    /// Names of the environment variables consumed, from `[env]`.
    #[serde(default)]
    pub env: EnvSection,

    /// Build phase settings from `[build]`.
    #[serde(default)]
    pub build: BuildSection,

    /// Package phase entries from `[[package]]`.
    #[serde(default = "default_packages")]
    pub package: Vec<PackageSpec>,
}

/// Validated configuration. Only obtainable through
/// `PipelineConfig::try_from(RawPipelineConfig)` or [`PipelineConfig::default`].
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub config: ConfigSection,
    pub tool: ToolSection,
    pub env: EnvSection,
    pub build: BuildSection,
    pub package: Vec<PackageSpec>,
}

impl PipelineConfig {
    pub(crate) fn new_unchecked(raw: RawPipelineConfig) -> Self {
        Self {
            config: raw.config,
            tool: raw.tool,
            env: raw.env,
            build: raw.build,
            package: raw.package,
        }
    }
}

impl Default for RawPipelineConfig {
    fn default() -> Self {
        Self {
            config: ConfigSection::default(),
            tool: ToolSection::default(),
            env: EnvSection::default(),
            build: BuildSection::default(),
            package: default_packages(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new_unchecked(RawPipelineConfig::default())
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// `"cancel"` (default) or `"wait"`.
    #[serde(default)]
    pub on_failure: OnFailure,

    /// How long to keep draining a child's output pipes after it exited.
    #[serde(default = "default_drain_timeout_ms")]
    pub drain_timeout_ms: u64,
}

fn default_drain_timeout_ms() -> u64 {
    2000
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            on_failure: OnFailure::default(),
            drain_timeout_ms: default_drain_timeout_ms(),
        }
    }
}

/// `[tool]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolSection {
    pub program: String,
    pub source_dir: String,
    pub build_dir: String,
    pub install_prefix: String,
    /// CMake cache variable that receives the WebRTC root.
    pub root_var: String,
    /// CMake cache variable that receives the dependencies path.
    pub deps_var: String,
}

impl Default for ToolSection {
    fn default() -> Self {
        Self {
            program: "cmake".to_string(),
            source_dir: ".".to_string(),
            build_dir: "build".to_string(),
            install_prefix: ".install".to_string(),
            root_var: "WEBRTC_ROOT_DIR".to_string(),
            deps_var: "DepsPath".to_string(),
        }
    }
}

/// `[env]` section: which environment variables to read.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnvSection {
    pub generator: String,
    pub toolset: String,
    pub webrtc_root: String,
    pub deps_path: String,
    pub deps_arch: String,
    /// Presence (non-empty) of this variable marks a run on the CI agent.
    pub ci_flag: String,
}

impl Default for EnvSection {
    fn default() -> Self {
        Self {
            generator: "CMAKE_GENERATOR".to_string(),
            toolset: "CMAKE_TOOLSET".to_string(),
            webrtc_root: "WEBRTC_PATH".to_string(),
            deps_path: "OBS_DEPENDENCIES_PATH".to_string(),
            deps_arch: "OBS_DEPENDENCIES_ARCH".to_string(),
            ci_flag: "APPVEYOR".to_string(),
        }
    }
}

/// `[build]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BuildSection {
    pub target: String,
    pub flavors: Vec<String>,
    /// Logger assembly handed to MSBuild when running on the CI agent.
    pub ci_logger: String,
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            target: "INSTALL".to_string(),
            flavors: ["Debug", "MinSizeRel", "RelWithDebInfo", "Release"]
                .into_iter()
                .map(String::from)
                .collect(),
            ci_logger: r"C:\Program Files\AppVeyor\BuildAgent\Appveyor.MSBuildLogger.dll"
                .to_string(),
        }
    }
}

/// One `[[package]]` entry.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PackageSpec {
    /// Display name used for the output prefix.
    pub name: String,
    pub target: String,
    pub flavor: String,
}

fn default_packages() -> Vec<PackageSpec> {
    vec![
        PackageSpec {
            name: "7-Zip".to_string(),
            target: "PACKAGE_7Z".to_string(),
            flavor: "RelWithDebInfo".to_string(),
        },
        PackageSpec {
            name: "Zip".to_string(),
            target: "PACKAGE_ZIP".to_string(),
            flavor: "Release".to_string(),
        },
    ]
}
