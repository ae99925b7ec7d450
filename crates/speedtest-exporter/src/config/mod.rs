//! Exporter config loader.
//!
//! Values come from an optional YAML file (strict parsing) named by
//! `SPEEDTEST_CONFIG`, then `SPEEDTEST_*` environment variables on top.

pub mod schema;

use std::fs;
use std::str::FromStr;

use speedtest_core::error::{ExporterError, Result};

pub use schema::ExporterConfig;

pub const CONFIG_FILE_ENV: &str = "SPEEDTEST_CONFIG";
pub const CACHE_FOR_ENV: &str = "SPEEDTEST_CACHE_FOR";
pub const SERVER_ENV: &str = "SPEEDTEST_SERVER";
pub const TIMEOUT_ENV: &str = "SPEEDTEST_TIMEOUT";
pub const HOST_ENV: &str = "SPEEDTEST_HOST";
pub const PORT_ENV: &str = "SPEEDTEST_PORT";
pub const BINARY_ENV: &str = "SPEEDTEST_BINARY";

pub fn load_from_env() -> Result<ExporterConfig> {
    let mut cfg = match std::env::var(CONFIG_FILE_ENV) {
        Ok(path) if !path.trim().is_empty() => parse_file(path.trim())?,
        _ => ExporterConfig::default(),
    };
    apply_env(&mut cfg, |key| std::env::var(key).ok())?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn load_from_file(path: &str) -> Result<ExporterConfig> {
    let cfg = parse_file(path)?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn load_from_str(s: &str) -> Result<ExporterConfig> {
    let cfg = parse_str(s)?;
    cfg.validate()?;
    Ok(cfg)
}

/// Overlay `SPEEDTEST_*` variables resolved through `lookup`.
///
/// Blank values count as unset, so `SPEEDTEST_SERVER=""` leaves server
/// selection to the tool.
pub fn apply_env<F>(cfg: &mut ExporterConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| {
        lookup(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    if let Some(v) = get(CACHE_FOR_ENV) {
        cfg.cache_for_secs = parse_var(CACHE_FOR_ENV, &v)?;
    }
    if let Some(v) = get(SERVER_ENV) {
        cfg.server_id = Some(parse_var(SERVER_ENV, &v)?);
    }
    if let Some(v) = get(TIMEOUT_ENV) {
        cfg.timeout_secs = parse_var(TIMEOUT_ENV, &v)?;
    }
    if let Some(v) = get(HOST_ENV) {
        cfg.host = v;
    }
    if let Some(v) = get(PORT_ENV) {
        cfg.port = parse_var(PORT_ENV, &v)?;
    }
    if let Some(v) = get(BINARY_ENV) {
        cfg.binary = v;
    }
    Ok(())
}

fn parse_var<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| ExporterError::Config(format!("{key}={value:?} is invalid: {e}")))
}

fn parse_file(path: &str) -> Result<ExporterConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| ExporterError::Config(format!("read config {path} failed: {e}")))?;
    parse_str(&s)
}

fn parse_str(s: &str) -> Result<ExporterConfig> {
    serde_yaml::from_str(s).map_err(|e| ExporterError::Config(format!("invalid yaml: {e}")))
}
