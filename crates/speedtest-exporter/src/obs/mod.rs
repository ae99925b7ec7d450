//! In-process metrics.
//!
//! The published speedtest gauges plus a few exporter counters, rendered in
//! the Prometheus text exposition format by the `/metrics` handler.

pub mod metrics;
