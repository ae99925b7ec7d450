//! Decoder for `speedtest --format=json` output.
//!
//! Only the final `"type": "result"` payload is accepted. Progress payloads
//! never reach this module because the probe disables them, so anything else
//! is treated as an incomplete result.

use serde::Deserialize;
use serde_json::Value;

use crate::error::ProbeFailure;
use crate::measurement::{bytes_to_bits, MeasurementResult};

#[derive(Debug, Deserialize)]
struct ResultPayload {
    server: Server,
    ping: Ping,
    download: Transfer,
    upload: Transfer,
}

#[derive(Debug, Deserialize)]
struct Server {
    id: ServerId,
}

/// Older CLI builds emit the id as a string, some as an integral float.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ServerId {
    Number(u64),
    Float(f64),
    Text(String),
}

impl ServerId {
    fn value(&self) -> Result<u64, ProbeFailure> {
        match self {
            ServerId::Number(n) => Ok(*n),
            ServerId::Float(f) if f.fract() == 0.0 && *f >= 0.0 && *f < u64::MAX as f64 => Ok(*f as u64),
            ServerId::Float(f) => Err(ProbeFailure::IncompleteResult(format!(
                "server.id is not a whole number: {f}"
            ))),
            ServerId::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| ProbeFailure::IncompleteResult(format!("server.id is not numeric: {s:?}"))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Ping {
    jitter: f64,
    latency: f64,
}

#[derive(Debug, Deserialize)]
struct Transfer {
    /// Bytes per second.
    bandwidth: f64,
}

/// Decode raw standard output into a successful measurement.
pub fn decode(raw: &[u8]) -> Result<MeasurementResult, ProbeFailure> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Err(ProbeFailure::MalformedOutput("empty output".into()));
    }

    let value: Value =
        serde_json::from_slice(raw).map_err(|e| ProbeFailure::MalformedOutput(e.to_string()))?;

    let Some(obj) = value.as_object() else {
        return Err(ProbeFailure::IncompleteResult("payload is not a json object".into()));
    };

    if let Some(err) = obj.get("error") {
        let msg = match err {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return Err(ProbeFailure::DomainError(msg));
    }

    match obj.get("type").and_then(Value::as_str) {
        Some("result") => {}
        other => {
            return Err(ProbeFailure::IncompleteResult(format!(
                "unexpected payload type: {}",
                other.unwrap_or("<missing>")
            )))
        }
    }

    let payload: ResultPayload = serde_json::from_value(value)
        .map_err(|e| ProbeFailure::IncompleteResult(e.to_string()))?;

    Ok(MeasurementResult {
        server_id: payload.server.id.value()?,
        jitter_ms: payload.ping.jitter,
        ping_ms: payload.ping.latency,
        download_bps: bytes_to_bits(payload.download.bandwidth),
        upload_bps: bytes_to_bits(payload.upload.bandwidth),
        success: true,
    })
}

/// Total variant of [`decode`]: any failure becomes the failed sentinel.
pub fn parse(raw: &[u8]) -> MeasurementResult {
    match decode(raw) {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!(kind = e.kind().as_str(), error = %e, "discarding speedtest output");
            MeasurementResult::failed()
        }
    }
}
