//! Shared error types across speedtest crates.

use std::time::Duration;

use thiserror::Error;

/// Stable failure labels (used in logs and the failure counter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The child process exceeded its timeout.
    Timeout,
    /// The child process could not be spawned or exited non-zero.
    ExecutionError,
    /// Output was not valid JSON.
    MalformedOutput,
    /// The tool ran but reported an error of its own.
    DomainError,
    /// Valid JSON without the fields a finished result carries.
    IncompleteResult,
}

impl FailureKind {
    /// All kinds, in declaration order.
    pub const ALL: [FailureKind; 5] = [
        FailureKind::Timeout,
        FailureKind::ExecutionError,
        FailureKind::MalformedOutput,
        FailureKind::DomainError,
        FailureKind::IncompleteResult,
    ];

    /// String representation used as a metric label.
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Timeout => "timeout",
            FailureKind::ExecutionError => "execution_error",
            FailureKind::MalformedOutput => "malformed_output",
            FailureKind::DomainError => "domain_error",
            FailureKind::IncompleteResult => "incomplete_result",
        }
    }
}

/// Why a single measurement produced no result.
///
/// Every variant maps to the same observable outcome (the failed sentinel and
/// `up = 0`); the distinction only matters for logging.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProbeFailure {
    #[error("speedtest timed out after {0:?}")]
    Timeout(Duration),
    #[error("speedtest execution failed: {0}")]
    ExecutionError(String),
    #[error("speedtest output is not valid json: {0}")]
    MalformedOutput(String),
    #[error("speedtest reported an error: {0}")]
    DomainError(String),
    #[error("speedtest result incomplete: {0}")]
    IncompleteResult(String),
}

impl ProbeFailure {
    pub fn kind(&self) -> FailureKind {
        match self {
            ProbeFailure::Timeout(_) => FailureKind::Timeout,
            ProbeFailure::ExecutionError(_) => FailureKind::ExecutionError,
            ProbeFailure::MalformedOutput(_) => FailureKind::MalformedOutput,
            ProbeFailure::DomainError(_) => FailureKind::DomainError,
            ProbeFailure::IncompleteResult(_) => FailureKind::IncompleteResult,
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, ExporterError>;

/// Startup and configuration errors.
#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("invalid config: {0}")]
    Config(String),
    #[error("speedtest binary check failed: {0}")]
    BinaryCheck(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
