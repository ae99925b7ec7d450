use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use speedtest_core::error::{ExporterError, ProbeFailure, Result};
use tokio::process::Command;
use tokio::time::timeout;

use super::{build_args, Probe, ProbeInvocationConfig, RawOutput};

/// `--version` banner printed by the official CLI.
pub const OOKLA_BANNER: &str = "Speedtest by Ookla";

const INSTALL_HINT: &str = "install the official CLI from https://www.speedtest.net/apps/cli";

/// Runs the Ookla `speedtest` binary as a child process.
pub struct SpeedtestCli {
    binary: PathBuf,
}

impl SpeedtestCli {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self { binary: binary.into() }
    }
}

#[async_trait]
impl Probe for SpeedtestCli {
    async fn run(&self, cfg: &ProbeInvocationConfig) -> std::result::Result<RawOutput, ProbeFailure> {
        let args = build_args(cfg);
        tracing::debug!(binary = %self.binary.display(), ?args, "spawning speedtest");

        // kill_on_drop: the timeout below drops the child, which kills it.
        let child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ProbeFailure::ExecutionError(format!("spawn {} failed: {e}", self.binary.display()))
            })?;

        let output = match timeout(cfg.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(ProbeFailure::ExecutionError(format!("wait failed: {e}"))),
            Err(_) => return Err(ProbeFailure::Timeout(cfg.timeout)),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            let msg = if stderr.is_empty() {
                output.status.to_string()
            } else {
                format!("{}: {stderr}", output.status)
            };
            return Err(ProbeFailure::ExecutionError(msg));
        }

        Ok(RawOutput::new(output.stdout))
    }
}

/// Startup check: the binary resolves on `PATH` and identifies itself as the
/// official Ookla CLI. Returns the resolved path.
pub async fn verify_binary(binary: &str) -> Result<PathBuf> {
    let path = which::which(binary)
        .map_err(|e| ExporterError::BinaryCheck(format!("{binary} not found ({e}); {INSTALL_HINT}")))?;

    let out = Command::new(&path)
        .arg("--version")
        .stdin(Stdio::null())
        .output()
        .await?;

    let version = String::from_utf8_lossy(&out.stdout);
    if !out.status.success() || !version.contains(OOKLA_BANNER) {
        return Err(ExporterError::BinaryCheck(format!(
            "unofficial speedtest cli detected at {}; {INSTALL_HINT}",
            path.display()
        )));
    }

    tracing::info!(
        binary = %path.display(),
        version = version.lines().find(|l| !l.trim().is_empty()).unwrap_or_default().trim(),
        "speedtest binary verified"
    );
    Ok(path)
}
