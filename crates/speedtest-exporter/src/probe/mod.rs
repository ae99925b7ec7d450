//! External measurement probe.
//!
//! [`Probe`] is the seam between the cache and the outside world: the
//! production implementation spawns the Ookla CLI, tests swap in doubles that
//! return canned output without touching processes.

pub mod cli;

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use speedtest_core::error::ProbeFailure;

pub use cli::{verify_binary, SpeedtestCli, OOKLA_BANNER};

/// Per-invocation settings, derived from config once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeInvocationConfig {
    pub server_id: Option<u64>,
    pub timeout: Duration,
}

/// Standard output of a run that exited successfully.
#[derive(Debug, Clone)]
pub struct RawOutput {
    pub stdout: Bytes,
}

impl RawOutput {
    pub fn new(stdout: impl Into<Bytes>) -> Self {
        Self { stdout: stdout.into() }
    }
}

/// One measurement run. Implementations spawn at most one child per call and
/// never retry.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn run(&self, cfg: &ProbeInvocationConfig) -> Result<RawOutput, ProbeFailure>;
}

/// Non-interactive JSON run with the license prompts pre-accepted.
pub fn build_args(cfg: &ProbeInvocationConfig) -> Vec<String> {
    let mut args: Vec<String> = [
        "--format=json-pretty",
        "--progress=no",
        "--accept-license",
        "--accept-gdpr",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    if let Some(id) = cfg.server_id {
        args.push(format!("--server-id={id}"));
    }
    args
}
