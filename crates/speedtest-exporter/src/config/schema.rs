use std::net::SocketAddr;
use std::time::Duration;

use serde::Deserialize;
use speedtest_core::error::{ExporterError, Result};

use crate::probe::ProbeInvocationConfig;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ExporterConfig {
    /// How long a measurement is served before the next scrape re-runs it.
    /// `0` measures on every scrape.
    #[serde(default)]
    pub cache_for_secs: u64,

    /// Pin the probe to one server. `None` lets the tool pick.
    #[serde(default)]
    pub server_id: Option<u64>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_binary")]
    pub binary: String,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            cache_for_secs: 0,
            server_id: None,
            timeout_secs: default_timeout_secs(),
            host: default_host(),
            port: default_port(),
            binary: default_binary(),
        }
    }
}

impl ExporterConfig {
    pub fn validate(&self) -> Result<()> {
        if !(1..=3600).contains(&self.timeout_secs) {
            return Err(ExporterError::Config(
                "timeout_secs must be between 1 and 3600".into(),
            ));
        }
        if self.port == 0 {
            return Err(ExporterError::Config("port must not be 0".into()));
        }
        if self.binary.trim().is_empty() {
            return Err(ExporterError::Config("binary must not be empty".into()));
        }

        self.listen_addr()?;

        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ExporterError::Config(format!("invalid listen address {}:{}: {e}", self.host, self.port)))
    }

    pub fn cache_duration(&self) -> Duration {
        Duration::from_secs(self.cache_for_secs)
    }

    pub fn probe_config(&self) -> ProbeInvocationConfig {
        ProbeInvocationConfig {
            server_id: self.server_id,
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

fn default_timeout_secs() -> u64 {
    90
}
fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    9798
}
fn default_binary() -> String {
    "speedtest".into()
}
