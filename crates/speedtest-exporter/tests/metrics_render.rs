#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use speedtest_core::error::FailureKind;
use speedtest_core::MeasurementResult;
use speedtest_exporter::obs::metrics::ExporterMetrics;

const GAUGES: [&str; 6] = [
    "speedtest_server_id",
    "speedtest_jitter_latency_milliseconds",
    "speedtest_ping_latency_milliseconds",
    "speedtest_download_bits_per_second",
    "speedtest_upload_bits_per_second",
    "speedtest_up",
];

fn sample(body: &str, name: &str) -> String {
    body.lines()
        .find(|l| l.starts_with(name) && l[name.len()..].starts_with(' '))
        .unwrap_or_else(|| panic!("missing sample {name} in:\n{body}"))
        .to_string()
}

#[test]
fn initial_state_is_failed_sentinel() {
    let body = ExporterMetrics::new().render();
    for name in GAUGES {
        assert!(body.contains(&format!("# TYPE {name} gauge\n")), "{name}");
        assert_eq!(sample(&body, name), format!("{name} 0"));
    }
}

#[test]
fn successful_result_is_published() {
    let metrics = ExporterMetrics::new();
    metrics.snapshot.update(MeasurementResult {
        server_id: 12345,
        jitter_ms: 1.5,
        ping_ms: 10.2,
        download_bps: 100_000_000.0,
        upload_bps: 10_000_000.0,
        success: true,
    });

    let body = metrics.render();
    assert_eq!(sample(&body, "speedtest_server_id"), "speedtest_server_id 12345");
    assert_eq!(
        sample(&body, "speedtest_jitter_latency_milliseconds"),
        "speedtest_jitter_latency_milliseconds 1.5"
    );
    assert_eq!(
        sample(&body, "speedtest_ping_latency_milliseconds"),
        "speedtest_ping_latency_milliseconds 10.2"
    );
    assert_eq!(
        sample(&body, "speedtest_download_bits_per_second"),
        "speedtest_download_bits_per_second 100000000"
    );
    assert_eq!(
        sample(&body, "speedtest_upload_bits_per_second"),
        "speedtest_upload_bits_per_second 10000000"
    );
    assert_eq!(sample(&body, "speedtest_up"), "speedtest_up 1");
}

#[test]
fn failure_replaces_every_gauge() {
    let metrics = ExporterMetrics::new();
    metrics.snapshot.update(MeasurementResult {
        server_id: 1,
        jitter_ms: 2.0,
        ping_ms: 3.0,
        download_bps: 4.0,
        upload_bps: 5.0,
        success: true,
    });
    metrics.snapshot.update(MeasurementResult::failed());

    let body = metrics.render();
    for name in GAUGES {
        assert_eq!(sample(&body, name), format!("{name} 0"));
    }
}

#[test]
fn counters_start_at_zero_per_kind() {
    let metrics = ExporterMetrics::new();
    metrics.record_failure(FailureKind::DomainError);
    metrics.probe_runs.inc(&[]);

    let body = metrics.render();
    assert!(body.contains("# TYPE speedtest_probe_runs_total counter\n"));
    assert!(body.contains("\nspeedtest_probe_runs_total 1\n"));
    assert!(body.contains("speedtest_probe_failures_total{kind=\"domain_error\"} 1\n"));
    for kind in ["timeout", "execution_error", "malformed_output", "incomplete_result"] {
        assert!(
            body.contains(&format!("speedtest_probe_failures_total{{kind=\"{kind}\"}} 0\n")),
            "{kind}"
        );
    }
}

#[test]
fn update_with_publishes_computed_value() {
    let metrics = ExporterMetrics::new();
    let ok = MeasurementResult {
        server_id: 7,
        jitter_ms: 0.5,
        ping_ms: 3.0,
        download_bps: 8.0,
        upload_bps: 16.0,
        success: true,
    };

    metrics.snapshot.update_with(|| ok);
    assert_eq!(metrics.snapshot.read(), ok);

    metrics.snapshot.update_with(MeasurementResult::failed);
    assert_eq!(metrics.snapshot.read(), MeasurementResult::failed());
    assert!(sample(&metrics.render(), "speedtest_up").ends_with(" 0"));
}
