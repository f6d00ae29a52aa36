// tests/binary_exit.rs

#![cfg(unix)]

use std::error::Error;
use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use tempfile::TempDir;

use buildpipe_test_utils::stub_tool;

type TestResult = Result<(), Box<dyn Error>>;

/// A workspace holding a `Buildpipe.toml` whose tool is a logging `sh` stub.
struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// `body` runs after the stub has appended its arguments to `calls.log`.
    fn new(body: &str) -> Result<Self, Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let log = dir.path().join("calls.log");
        let script = format!("echo \"$*\" >> '{}'\n{body}", log.display());
        let tool = stub_tool(dir.path(), "fake-cmake", &script)?;

        fs::write(
            dir.path().join("Buildpipe.toml"),
            format!("[tool]\nprogram = '{}'\n", tool.display()),
        )?;
        Ok(Self { dir })
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_buildpipe"));
        cmd.current_dir(self.path())
            .env_remove("APPVEYOR")
            .env_remove("BUILDPIPE_LOG");
        cmd
    }

    fn calls(&self) -> Result<Vec<String>, Box<dyn Error>> {
        let log = fs::read_to_string(self.path().join("calls.log")).unwrap_or_default();
        Ok(log.lines().map(str::to_string).collect())
    }
}

#[test]
fn all_phases_succeeding_exits_zero() -> TestResult {
    let ws = Workspace::new("exit 0")?;

    ws.command().assert().code(0);

    let calls = ws.calls()?;
    assert_eq!(calls.len(), 7, "{calls:?}");
    assert!(calls.iter().any(|c| c.contains("--target PACKAGE_7Z")));
    assert!(calls.iter().any(|c| c.contains("--target PACKAGE_ZIP")));
    Ok(())
}

#[test]
fn failing_build_flavor_sets_the_process_exit_code() -> TestResult {
    let ws = Workspace::new(
        r#"case "$*" in
  *"--config MinSizeRel"*) exit 2 ;;
esac
exit 0"#,
    )?;

    ws.command().assert().code(2);

    let calls = ws.calls()?;
    assert!(calls.iter().any(|c| c.contains("--config MinSizeRel")));
    assert!(!calls.iter().any(|c| c.contains("PACKAGE_")), "{calls:?}");
    Ok(())
}

#[test]
fn failing_configure_exits_with_its_code_and_builds_nothing() -> TestResult {
    let ws = Workspace::new(
        r#"case "$1" in
  -H*) exit 1 ;;
esac
exit 0"#,
    )?;

    ws.command().assert().code(1);

    let calls = ws.calls()?;
    assert_eq!(calls.len(), 1, "{calls:?}");
    assert!(calls[0].starts_with("-H."));
    Ok(())
}

#[test]
fn invalid_config_exits_one_without_running_the_tool() -> TestResult {
    let ws = Workspace::new("exit 0")?;
    fs::write(ws.path().join("broken.toml"), "[build]\nflavors = []\n")?;

    let output = ws.command().args(["--config", "broken.toml"]).output()?;

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("buildpipe error"), "{stderr}");
    assert!(ws.calls()?.is_empty());
    Ok(())
}

#[test]
fn child_output_is_prefixed_on_the_real_streams() -> TestResult {
    let ws = Workspace::new(
        r#"case "$*" in
  *"--config Release"*) printf 'linking\n'; printf 'careful\n' >&2 ;;
esac
exit 0"#,
    )?;

    let output = ws.command().output()?;
    assert_eq!(output.status.code(), Some(0));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stdout.contains("[Release:Out] linking"), "{stdout}");
    assert!(stderr.contains("[Release:Err] careful"), "{stderr}");
    // Orchestrator logs go to stderr in their own shape, never to stdout.
    assert!(stderr.lines().any(|l| l.starts_with("buildpipe: ")), "{stderr}");
    assert!(!stdout.contains("buildpipe: "));
    Ok(())
}
