//! External probe command invocation.

use anyhow::{Context, Result};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::trace;

/// Upper bound for a single probe command.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Run `program` with `args` and return its stdout.
///
/// Fails if the program is missing, times out, or exits non-zero.
pub async fn run_probe(program: &str, args: &[&str]) -> Result<String> {
    trace!("Running probe: {} {}", program, args.join(" "));

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("Failed to spawn {program}"))?;

    let output = tokio::time::timeout(PROBE_TIMEOUT, child.wait_with_output())
        .await
        .with_context(|| format!("{program} timed out after {PROBE_TIMEOUT:?}"))?
        .with_context(|| format!("Failed to wait for {program}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!(
            "{} exited with code {:?}: {}",
            program,
            output.status.code(),
            stderr.trim()
        );
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_probe_captures_stdout() {
        let out = run_probe("echo", &["1234"]).await.unwrap();
        assert_eq!(out.trim(), "1234");
    }

    #[tokio::test]
    async fn test_run_probe_missing_program() {
        let err = run_probe("idle-jiggler-no-such-probe", &[]).await.unwrap_err();
        assert!(err.to_string().contains("Failed to spawn"));
    }

    #[tokio::test]
    async fn test_run_probe_non_zero_exit() {
        let err = run_probe("false", &[]).await.unwrap_err();
        assert!(err.to_string().contains("exited with code"));
    }
}
