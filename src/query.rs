//! Read-side service serving the latest sample.
//!
//! Independent of the collector's cadence: every call re-reads the store and
//! returns whatever the latest committed sample is, however stale. An empty
//! store is a valid state and yields all-`null` responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::{Sample, SampleReader, StoreError};

/// Body of `GET /metrics`. Unknown values serialize as `null`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatestMetricsResponse {
    pub block_height: Option<u64>,
    pub network_hash_rate: Option<f64>,
    pub difficulty: Option<f64>,
    pub mempool_size: Option<u64>,
}

impl From<&Sample> for LatestMetricsResponse {
    fn from(sample: &Sample) -> Self {
        Self {
            block_height: sample.block_height,
            network_hash_rate: sample.network_hash_rate,
            difficulty: sample.difficulty,
            mempool_size: sample.mempool_size,
        }
    }
}

/// Body of `GET /block_height`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockHeightResponse {
    pub block_height: Option<u64>,
    /// When the sample was stored.
    pub timestamp: Option<DateTime<Utc>>,
}

impl From<&Sample> for BlockHeightResponse {
    fn from(sample: &Sample) -> Self {
        Self {
            block_height: sample.block_height,
            timestamp: Some(sample.observed_at),
        }
    }
}

/// Latest-sample query service.
#[derive(Debug, Clone)]
pub struct QueryService {
    reader: SampleReader,
}

impl QueryService {
    pub fn new(reader: SampleReader) -> Self {
        Self { reader }
    }

    /// Latest metrics, all `None` when nothing has been stored yet.
    pub async fn latest_metrics(&self) -> Result<LatestMetricsResponse, StoreError> {
        Ok(self
            .reader
            .latest()
            .await?
            .as_ref()
            .map(LatestMetricsResponse::from)
            .unwrap_or_default())
    }

    /// Latest block height with its observation time.
    pub async fn latest_block_height(&self) -> Result<BlockHeightResponse, StoreError> {
        Ok(self
            .reader
            .latest()
            .await?
            .as_ref()
            .map(BlockHeightResponse::from)
            .unwrap_or_default())
    }

    /// Readiness check against the store.
    pub async fn ping(&self) -> Result<(), StoreError> {
        self.reader.ping().await
    }
}
