//! Parser for the probe's `key: value` output format.
//!
//! ```text
//! block_height: 820000
//! network_hash_rate: 450.5
//! difficulty: 60000000000000
//! mempool_size: 1200
//! ```
//!
//! Unknown keys and blank lines are skipped. Any other line without a `:`
//! fails the whole reading so partial garbage is never persisted. When a key
//! repeats, the last value wins.

use strum_macros::{AsRefStr, EnumString};

use crate::probe::ProbeError;
use crate::storage::RawMetrics;

/// Keys recognized in probe output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum MetricKey {
    BlockHeight,
    NetworkHashRate,
    Difficulty,
    MempoolSize,
}

/// Parse probe stdout into a reading.
///
/// # Errors
///
/// - [`ProbeError::NoData`] if the output is empty or whitespace
/// - [`ProbeError::MalformedLine`] for a line without the separator
/// - [`ProbeError::MalformedField`] for a value that does not fit its key
pub fn parse_output(output: &str) -> Result<RawMetrics, ProbeError> {
    if output.trim().is_empty() {
        return Err(ProbeError::NoData);
    }

    let mut metrics = RawMetrics::default();

    for (idx, line) in output.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            return Err(ProbeError::MalformedLine {
                line: idx + 1,
                content: line.to_string(),
            });
        };
        let (key, value) = (key.trim(), value.trim());

        let Ok(metric) = key.parse::<MetricKey>() else {
            tracing::trace!(key, "Ignoring unknown probe key");
            continue;
        };

        match metric {
            MetricKey::BlockHeight => metrics.block_height = Some(parse_count(metric, value)?),
            MetricKey::NetworkHashRate => {
                metrics.network_hash_rate = Some(parse_quantity(metric, value)?)
            }
            MetricKey::Difficulty => metrics.difficulty = Some(parse_quantity(metric, value)?),
            MetricKey::MempoolSize => metrics.mempool_size = Some(parse_count(metric, value)?),
        }
    }

    Ok(metrics)
}

fn malformed(key: MetricKey, value: &str) -> ProbeError {
    ProbeError::MalformedField {
        key: key.as_ref().to_string(),
        value: value.to_string(),
    }
}

/// Non-negative integer.
fn parse_count(key: MetricKey, value: &str) -> Result<u64, ProbeError> {
    value.parse::<u64>().map_err(|_| malformed(key, value))
}

/// Finite, non-negative float. Negative zero is rejected.
fn parse_quantity(key: MetricKey, value: &str) -> Result<f64, ProbeError> {
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() && v.is_sign_positive() => Ok(v),
        _ => Err(malformed(key, value)),
    }
}
