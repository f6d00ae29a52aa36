use std::fmt;

use serde::Deserialize;

/// What a phase does with its still-running siblings once one invocation
/// has failed.
///
/// - `Cancel`: kill the remaining children, wait for them to settle, then
///   report the failure (default behaviour).
/// - `Wait`: let the remaining children run to completion (their output keeps
///   streaming), then report the first failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OnFailure {
    #[default]
    Cancel,
    Wait,
}

/// The three fixed phases of a pipeline run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    Configure,
    Build,
    Package,
}

impl PhaseKind {
    /// The phase that follows this one, if any.
    pub fn next(self) -> Option<PhaseKind> {
        match self {
            PhaseKind::Configure => Some(PhaseKind::Build),
            PhaseKind::Build => Some(PhaseKind::Package),
            PhaseKind::Package => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PhaseKind::Configure => "configure",
            PhaseKind::Build => "build",
            PhaseKind::Package => "package",
        }
    }
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_follow_fixed_order() {
        assert_eq!(PhaseKind::Configure.next(), Some(PhaseKind::Build));
        assert_eq!(PhaseKind::Build.next(), Some(PhaseKind::Package));
        assert_eq!(PhaseKind::Package.next(), None);
    }

    #[derive(Debug, Deserialize)]
    struct Holder {
        on_failure: OnFailure,
    }

    #[test]
    fn on_failure_uses_lowercase_names() {
        let h: Holder = toml::from_str("on_failure = \"wait\"").unwrap();
        assert_eq!(h.on_failure, OnFailure::Wait);
        assert!(toml::from_str::<Holder>("on_failure = \"Cancel\"").is_err());
        assert_eq!(OnFailure::default(), OnFailure::Cancel);
    }
}
