//! Metrics registry for the exporter.
//!
//! `MetricsSnapshot` holds the six speedtest gauges as one value behind a
//! lock so a scrape never observes a half-applied measurement. Counters use
//! dynamic labels backed by `DashMap`, flattened into sorted key vectors to
//! keep rendering order deterministic.

use dashmap::DashMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use speedtest_core::error::FailureKind;
use speedtest_core::MeasurementResult;

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn write_header(out: &mut String, name: &str, help: &str, kind: &str) {
    let _ = writeln!(out, "# HELP {} {}", name, help);
    let _ = writeln!(out, "# TYPE {} {}", name, kind);
}

#[derive(Default)]
pub struct CounterVec {
    map: DashMap<Vec<(String, String)>, AtomicU64>,
}

impl CounterVec {
    /// Increment by 1.
    pub fn inc(&self, labels: &[(&str, &str)]) {
        self.add(labels, 1);
    }

    /// Increment by an arbitrary value.
    pub fn add(&self, labels: &[(&str, &str)], v: u64) {
        let mut key: Vec<(String, String)> = labels
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        key.sort();

        let counter = self.map.entry(key).or_insert_with(|| AtomicU64::new(0));
        counter.fetch_add(v, Ordering::Relaxed);
    }

    /// Current value for one label set (0 when never touched).
    pub fn get(&self, labels: &[(&str, &str)]) -> u64 {
        let mut key: Vec<(String, String)> = labels
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        key.sort();
        self.map
            .get(&key)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Render in Prometheus text exposition format.
    fn render(&self, name: &str, help: &str, out: &mut String) {
        write_header(out, name, help, "counter");

        let mut rows: Vec<(String, u64)> = self
            .map
            .iter()
            .map(|r| {
                let label_str = r
                    .key()
                    .iter()
                    .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
                    .collect::<Vec<_>>()
                    .join(",");
                (label_str, r.value().load(Ordering::Relaxed))
            })
            .collect();
        rows.sort();

        for (label_str, val) in rows {
            if label_str.is_empty() {
                let _ = writeln!(out, "{} {}", name, val);
            } else {
                let _ = writeln!(out, "{}{{{}}} {}", name, label_str, val);
            }
        }
    }
}

/// The published speedtest gauges.
///
/// Starts at the failed sentinel; `update` swaps in a whole result at once.
pub struct MetricsSnapshot {
    current: RwLock<MeasurementResult>,
}

impl Default for MetricsSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsSnapshot {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(MeasurementResult::failed()),
        }
    }

    pub fn update(&self, result: MeasurementResult) {
        self.update_with(|| result);
    }

    /// Publish the value `f` computes while the write lock is held.
    pub fn update_with<F>(&self, f: F)
    where
        F: FnOnce() -> MeasurementResult,
    {
        // a poisoned lock still holds a whole value; keep publishing
        let mut guard = match self.current.write() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = f();
    }

    pub fn read(&self) -> MeasurementResult {
        match self.current.read() {
            Ok(g) => *g,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// Render the six gauges from a single consistent read.
    fn render(&self, out: &mut String) {
        let r = self.read();
        let gauges: [(&str, &str, f64); 6] = [
            ("speedtest_server_id", "Speedtest server ID used to test", r.server_id as f64),
            ("speedtest_jitter_latency_milliseconds", "Speedtest current Jitter in ms", r.jitter_ms),
            ("speedtest_ping_latency_milliseconds", "Speedtest current Ping in ms", r.ping_ms),
            ("speedtest_download_bits_per_second", "Speedtest current Download Speed in bit/s", r.download_bps),
            ("speedtest_upload_bits_per_second", "Speedtest current Upload speed in bits/s", r.upload_bps),
            ("speedtest_up", "Speedtest status whether the scrape worked", f64::from(r.up())),
        ];

        for (name, help, value) in gauges {
            write_header(out, name, help, "gauge");
            let _ = writeln!(out, "{} {}", name, value);
        }
    }
}

pub struct ExporterMetrics {
    pub snapshot: MetricsSnapshot,
    pub probe_runs: CounterVec,
    pub probe_failures: CounterVec,
}

impl Default for ExporterMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ExporterMetrics {
    /// Every series exists from the start, at 0.
    pub fn new() -> Self {
        let probe_runs = CounterVec::default();
        probe_runs.add(&[], 0);
        let probe_failures = CounterVec::default();
        for kind in FailureKind::ALL {
            probe_failures.add(&[("kind", kind.as_str())], 0);
        }
        Self {
            snapshot: MetricsSnapshot::new(),
            probe_runs,
            probe_failures,
        }
    }

    pub fn record_failure(&self, kind: FailureKind) {
        self.probe_failures.inc(&[("kind", kind.as_str())]);
    }

    /// Render all registered metrics.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.snapshot.render(&mut out);
        self.probe_runs.render(
            "speedtest_probe_runs_total",
            "Speedtest CLI invocations started",
            &mut out,
        );
        self.probe_failures.render(
            "speedtest_probe_failures_total",
            "Speedtest CLI invocations that produced no result, by failure kind",
            &mut out,
        );
        out
    }
}
