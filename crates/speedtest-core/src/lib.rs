//! speedtest core: measurement values, the result parser, and error types.
//!
//! This crate carries no runtime or transport dependencies so the parsing
//! rules can be exercised without spawning processes or binding sockets.
//!
//! # Panic-free parsing
//! Panics, `unwrap`, and `expect` are compile-denied here. Malformed tool
//! output always surfaces as a `ProbeFailure` and never crashes the exporter.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod measurement;
pub mod parser;

pub use error::{ExporterError, FailureKind, ProbeFailure, Result};
pub use measurement::MeasurementResult;
