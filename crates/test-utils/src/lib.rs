pub mod builders;
pub mod fake_executor;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use buildpipe::logging::{build_filter, LogLineFormat, LOG_ENV_VAR};

/// Upper bound for any single awaited step in a test.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

static INIT: Once = Once::new();

/// Route tracing into the test harness with the production line format.
///
/// Filtering follows `BUILDPIPE_LOG`, e.g.
/// `BUILDPIPE_LOG=buildpipe::exec=debug cargo test`. Output only shows for
/// failing tests unless run with `--nocapture`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let env_value = std::env::var(LOG_ENV_VAR).ok();
        let _ = tracing_subscriber::fmt()
            .event_format(LogLineFormat)
            .with_env_filter(build_filter(None, env_value.as_deref()))
            .with_test_writer()
            .try_init();
    });
}

/// Await `f`, failing the test after [`TEST_TIMEOUT`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(TEST_TIMEOUT, f).await {
        Ok(value) => value,
        Err(_) => panic!("test step timed out after {TEST_TIMEOUT:?}"),
    }
}

/// Write an executable `sh` script named `name` into `dir` to stand in for
/// the build tool. Its arguments arrive as `"$@"`.
#[cfg(unix)]
pub fn stub_tool(
    dir: &std::path::Path,
    name: &str,
    body: &str,
) -> std::io::Result<std::path::PathBuf> {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n"))?;
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
    Ok(path)
}
