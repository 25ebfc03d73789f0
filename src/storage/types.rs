//! Storage data types.

use chrono::{DateTime, Utc};

use crate::storage::StoreError;

/// One metrics reading as produced by a probe, before persistence.
///
/// Every field is optional: a probe may legitimately report partial data.
/// Missing values mean "unknown" and are never coerced to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawMetrics {
    pub block_height: Option<u64>,
    pub network_hash_rate: Option<f64>,
    pub difficulty: Option<f64>,
    pub mempool_size: Option<u64>,
}

impl RawMetrics {
    /// True when the reading carries no value at all.
    pub fn is_empty(&self) -> bool {
        self.block_height.is_none()
            && self.network_hash_rate.is_none()
            && self.difficulty.is_none()
            && self.mempool_size.is_none()
    }

    /// Set the block height.
    pub fn with_block_height(mut self, height: u64) -> Self {
        self.block_height = Some(height);
        self
    }

    /// Set the network hash rate.
    pub fn with_network_hash_rate(mut self, rate: f64) -> Self {
        self.network_hash_rate = Some(rate);
        self
    }

    /// Set the difficulty.
    pub fn with_difficulty(mut self, difficulty: f64) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    /// Set the mempool size.
    pub fn with_mempool_size(mut self, size: u64) -> Self {
        self.mempool_size = Some(size);
        self
    }
}

/// A persisted, immutable observation.
///
/// `sequence_id` and `observed_at` are assigned by the writer at insertion
/// time; the greatest `sequence_id` is the latest sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub sequence_id: i64,
    pub observed_at: DateTime<Utc>,
    pub block_height: Option<u64>,
    pub network_hash_rate: Option<f64>,
    pub difficulty: Option<f64>,
    pub mempool_size: Option<u64>,
}

impl Sample {
    /// The metric values of this sample, without store-assigned fields.
    pub fn metrics(&self) -> RawMetrics {
        RawMetrics {
            block_height: self.block_height,
            network_hash_rate: self.network_hash_rate,
            difficulty: self.difficulty,
            mempool_size: self.mempool_size,
        }
    }
}

/// Row shape of the `samples` table.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct SampleRow {
    pub sequence_id: i64,
    pub observed_at: i64,
    pub block_height: Option<i64>,
    pub network_hash_rate: Option<f64>,
    pub difficulty: Option<f64>,
    pub mempool_size: Option<i64>,
}

impl TryFrom<SampleRow> for Sample {
    type Error = StoreError;

    fn try_from(row: SampleRow) -> Result<Self, Self::Error> {
        let observed_at = DateTime::from_timestamp_micros(row.observed_at).ok_or_else(|| {
            StoreError::Invalid(format!("observed_at out of range: {}", row.observed_at))
        })?;

        Ok(Self {
            sequence_id: row.sequence_id,
            observed_at,
            block_height: row.block_height.map(to_unsigned).transpose()?,
            network_hash_rate: row.network_hash_rate,
            difficulty: row.difficulty,
            mempool_size: row.mempool_size.map(to_unsigned).transpose()?,
        })
    }
}

/// SQLite integers are signed; values above `i64::MAX` cannot be stored.
pub(crate) fn to_signed(value: u64) -> Result<i64, StoreError> {
    i64::try_from(value).map_err(|_| StoreError::Invalid(format!("integer out of range: {value}")))
}

fn to_unsigned(value: i64) -> Result<u64, StoreError> {
    u64::try_from(value).map_err(|_| StoreError::Invalid(format!("negative integer: {value}")))
}
