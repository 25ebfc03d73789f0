//! Core probe trait and error type.

use thiserror::Error;

use crate::storage::RawMetrics;

/// Errors that can occur while obtaining a reading.
///
/// Every variant is recoverable at the collector level by skipping the cycle.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The source could not be started (missing binary, permission denied).
    #[error("metrics source unavailable: {0}")]
    Unavailable(String),

    /// The process exited unsuccessfully; carries its stderr.
    #[error("metrics process failed: {0}")]
    ProcessFailed(String),

    /// The process succeeded but printed nothing.
    #[error("metrics source returned no data")]
    NoData,

    /// A known key carried a value that does not parse as its type.
    #[error("malformed value for '{key}': '{value}'")]
    MalformedField { key: String, value: String },

    /// A non-blank line without the `key: value` separator.
    #[error("malformed line {line}: '{content}'")]
    MalformedLine { line: usize, content: String },

    /// The configured probe timeout elapsed.
    #[error("metrics source timed out")]
    Timeout,
}

/// A source of blockchain metrics readings.
///
/// The collector only depends on this trait, so the external-process strategy
/// can be swapped for e.g. a direct RPC client.
#[async_trait::async_trait]
pub trait MetricsSource: Send + Sync + 'static {
    /// Identifier used in logs.
    fn name(&self) -> &str;

    /// Obtain one reading.
    async fn fetch(&self) -> Result<RawMetrics, ProbeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ProbeError::ProcessFailed("connection refused".to_string());
        assert_eq!(err.to_string(), "metrics process failed: connection refused");

        let err = ProbeError::MalformedField {
            key: "difficulty".to_string(),
            value: "abc".to_string(),
        };
        assert!(err.to_string().contains("difficulty"));
        assert!(err.to_string().contains("abc"));
    }
}
