//! User-facing storage facades.
//!
//! - `SampleWriter`: Appends via the writer actor, acknowledged after commit
//! - `SampleReader`: Latest-sample query over the read pool

use tokio::sync::{mpsc, oneshot};

use crate::storage::StoreError;
use crate::storage::actor::Command;
use crate::storage::db::SqlitePool;
use crate::storage::types::{RawMetrics, Sample, SampleRow};

// =============================================================================
// Writer
// =============================================================================

/// Append-only storage writer.
///
/// Cheap to clone; all clones feed the same writer actor, so appends are
/// serialized no matter how many handles exist.
#[derive(Clone)]
pub struct SampleWriter {
    tx: mpsc::Sender<Command>,
}

impl std::fmt::Debug for SampleWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleWriter").finish_non_exhaustive()
    }
}

impl SampleWriter {
    pub(crate) fn new(tx: mpsc::Sender<Command>) -> Self {
        Self { tx }
    }

    /// Append a sample.
    ///
    /// Returns the stored row with its assigned `sequence_id` and
    /// `observed_at`. On `Ok`, the row is committed and visible to readers.
    pub async fn append(&self, metrics: RawMetrics) -> Result<Sample, StoreError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Append { metrics, reply })
            .await
            .map_err(|_| StoreError::Unavailable("writer actor is not running".to_string()))?;

        rx.await
            .map_err(|_| StoreError::Unavailable("writer actor dropped the request".to_string()))?
    }

    pub(crate) async fn shutdown(&self) -> Result<(), StoreError> {
        self.tx
            .send(Command::Shutdown)
            .await
            .map_err(|_| StoreError::Unavailable("writer actor is not running".to_string()))
    }
}

// =============================================================================
// Reader
// =============================================================================

/// Latest-sample reader.
///
/// Every call re-reads the database; there is no cache.
#[derive(Clone)]
pub struct SampleReader {
    pool: SqlitePool,
}

impl std::fmt::Debug for SampleReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleReader").finish_non_exhaustive()
    }
}

impl SampleReader {
    pub(crate) fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// The sample with the greatest `sequence_id`, or `None` for an empty store.
    pub async fn latest(&self) -> Result<Option<Sample>, StoreError> {
        let row: Option<SampleRow> = sqlx::query_as(
            "SELECT sequence_id, observed_at, block_height, network_hash_rate, difficulty, mempool_size
             FROM samples
             ORDER BY sequence_id DESC
             LIMIT 1",
        )
        .fetch_optional(self.pool.inner())
        .await?;

        row.map(Sample::try_from).transpose()
    }

    /// Cheap connectivity check.
    pub async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1 FROM samples LIMIT 1")
            .fetch_optional(self.pool.inner())
            .await?;
        Ok(())
    }
}
