//! Measurement values published by the exporter.

/// Outcome of one probe, already converted to exported units.
///
/// A failed measurement is never "absent": it is the all-zero value returned
/// by [`MeasurementResult::failed`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasurementResult {
    pub server_id: u64,
    pub jitter_ms: f64,
    pub ping_ms: f64,
    pub download_bps: f64,
    pub upload_bps: f64,
    pub success: bool,
}

impl MeasurementResult {
    /// The failed sentinel: every numeric field zero, `success = false`.
    pub const fn failed() -> Self {
        Self {
            server_id: 0,
            jitter_ms: 0.0,
            ping_ms: 0.0,
            download_bps: 0.0,
            upload_bps: 0.0,
            success: false,
        }
    }

    /// `1` for a successful measurement, `0` otherwise.
    pub fn up(&self) -> u8 {
        u8::from(self.success)
    }
}

impl Default for MeasurementResult {
    fn default() -> Self {
        Self::failed()
    }
}

/// Bytes/second to bits/second. Multiplying by a power of two is exact.
pub fn bytes_to_bits(bytes_per_sec: f64) -> f64 {
    bytes_per_sec * 8.0
}

/// Human-readable megabit rate for log lines, e.g. `100.0Mbps`.
pub fn format_megabits(bits_per_sec: f64) -> String {
    let megabits = (bits_per_sec / 1_000_000.0 * 100.0).round() / 100.0;
    format!("{megabits:?}Mbps")
}
