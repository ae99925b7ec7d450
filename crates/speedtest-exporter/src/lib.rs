//! speedtest exporter library entry.
//!
//! Wires the probe, the measurement cache and the metrics snapshot behind an
//! axum router. Consumed by the binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod cache;
pub mod config;
pub mod obs;
pub mod ops;
pub mod probe;
pub mod router;
