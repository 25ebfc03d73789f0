//! Writer actor with exclusive ownership of inserts.
//!
//! Single-writer pattern: one task owns the write path and processes commands
//! received over an MPSC channel. Every append carries a oneshot reply that is
//! answered only after the row is committed, so a successful append is durable
//! and visible to readers before the caller continues.

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::storage::StoreError;
use crate::storage::db::SqlitePool;
use crate::storage::types::{RawMetrics, Sample, to_signed};

/// Commands sent to the writer actor.
#[derive(Debug)]
pub enum Command {
    /// Append one sample and report the stored row.
    Append {
        metrics: RawMetrics,
        reply: oneshot::Sender<Result<Sample, StoreError>>,
    },
    /// Graceful shutdown.
    Shutdown,
}

/// Database writer actor.
pub struct DbActor {
    pool: SqlitePool,
    rx: mpsc::Receiver<Command>,
    /// Last assigned `observed_at` (Unix micros); keeps timestamps non-decreasing.
    last_observed: i64,
}

impl DbActor {
    /// Spawn the writer actor task.
    ///
    /// The schema must already exist. The last persisted `observed_at` is
    /// loaded so timestamps stay monotonic across restarts.
    pub async fn spawn(
        pool: SqlitePool,
        channel_capacity: usize,
    ) -> Result<(JoinHandle<()>, mpsc::Sender<Command>), StoreError> {
        let (tx, rx) = mpsc::channel(channel_capacity);

        let (last_observed,): (Option<i64>,) =
            sqlx::query_as("SELECT MAX(observed_at) FROM samples")
                .fetch_one(pool.inner())
                .await?;

        let actor = DbActor {
            pool,
            rx,
            last_observed: last_observed.unwrap_or(i64::MIN),
        };
        let handle = tokio::spawn(actor.run());

        Ok((handle, tx))
    }

    async fn run(mut self) {
        tracing::info!("DbActor started");

        while let Some(cmd) = self.rx.recv().await {
            match cmd {
                Command::Append { metrics, reply } => {
                    let result = self.append(&metrics).await;
                    if let Err(e) = &result {
                        tracing::error!(error = %e, "Sample append failed");
                    }
                    // Caller may have gone away; the row is committed regardless.
                    let _ = reply.send(result);
                }
                Command::Shutdown => {
                    tracing::info!("DbActor shutting down");
                    break;
                }
            }
        }

        tracing::info!("DbActor stopped");
    }

    /// Insert one row in a single atomic statement.
    async fn append(&mut self, m: &RawMetrics) -> Result<Sample, StoreError> {
        let block_height = m.block_height.map(to_signed).transpose()?;
        let mempool_size = m.mempool_size.map(to_signed).transpose()?;

        let observed_at = Utc::now().timestamp_micros().max(self.last_observed);

        let result = sqlx::query(
            "INSERT INTO samples (block_height, network_hash_rate, difficulty, mempool_size, observed_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(block_height)
        .bind(m.network_hash_rate)
        .bind(m.difficulty)
        .bind(mempool_size)
        .bind(observed_at)
        .execute(self.pool.inner())
        .await?;

        self.last_observed = observed_at;

        let sample = Sample {
            sequence_id: result.last_insert_rowid(),
            observed_at: chrono::DateTime::from_timestamp_micros(observed_at).ok_or_else(|| {
                StoreError::Invalid(format!("observed_at out of range: {observed_at}"))
            })?,
            block_height: m.block_height,
            network_hash_rate: m.network_hash_rate,
            difficulty: m.difficulty,
            mempool_size: m.mempool_size,
        };

        tracing::debug!(sequence_id = sample.sequence_id, "Sample appended");
        Ok(sample)
    }
}
