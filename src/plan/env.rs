// src/plan/env.rs

use crate::config::EnvSection;

/// Snapshot of the environment values the pipeline consumes.
///
/// Read once, before the Configure invocation is built. Missing variables
/// substitute as empty strings; nothing is validated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildEnv {
    pub generator: String,
    pub toolset: String,
    pub webrtc_root: String,
    pub deps_path: String,
    pub deps_arch: String,
    /// True when the CI flag variable is set to a non-empty value.
    pub ci_agent: bool,
}

impl BuildEnv {
    /// Read the variables named in `names` from the process environment.
    pub fn from_env(names: &EnvSection) -> Self {
        Self::from_lookup(names, |key| {
            std::env::var_os(key).map(|v| v.to_string_lossy().into_owned())
        })
    }

    /// Build a snapshot from an arbitrary lookup (used by tests).
    pub fn from_lookup<F>(names: &EnvSection, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).unwrap_or_default();

        Self {
            generator: get(&names.generator),
            toolset: get(&names.toolset),
            webrtc_root: get(&names.webrtc_root),
            deps_path: get(&names.deps_path),
            deps_arch: get(&names.deps_arch),
            ci_agent: lookup(&names.ci_flag).is_some_and(|v| !v.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn reads_configured_names() {
        let env = BuildEnv::from_lookup(
            &EnvSection::default(),
            lookup_from(&[
                ("CMAKE_GENERATOR", "Visual Studio 15 2017"),
                ("CMAKE_TOOLSET", "v141"),
                ("WEBRTC_PATH", "C:/webrtc"),
                ("OBS_DEPENDENCIES_PATH", "C:/deps"),
                ("OBS_DEPENDENCIES_ARCH", "win64"),
                ("APPVEYOR", "True"),
            ]),
        );

        assert_eq!(env.generator, "Visual Studio 15 2017");
        assert_eq!(env.toolset, "v141");
        assert_eq!(env.webrtc_root, "C:/webrtc");
        assert_eq!(env.deps_path, "C:/deps");
        assert_eq!(env.deps_arch, "win64");
        assert!(env.ci_agent);
    }

    #[test]
    fn missing_values_are_empty() {
        let env = BuildEnv::from_lookup(&EnvSection::default(), lookup_from(&[]));
        assert_eq!(env, BuildEnv::default());
    }

    #[test]
    fn empty_ci_flag_is_not_ci() {
        let env = BuildEnv::from_lookup(&EnvSection::default(), lookup_from(&[("APPVEYOR", "")]));
        assert!(!env.ci_agent);
    }
}
