//! Storage builder and handles.
//!
//! Provides a builder pattern for constructing the storage layer
//! and a handles struct for accessing the storage facades.

use std::path::{Path, PathBuf};

use tokio::task::JoinHandle;

use crate::storage::StoreError;
use crate::storage::actor::DbActor;
use crate::storage::db::SqlitePool;
use crate::storage::schema::init_schema;
use crate::storage::{SampleReader, SampleWriter};

/// Default channel capacity for writer commands.
///
/// There is a single collector appending about once a minute; a small buffer
/// is plenty.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Builder for constructing the storage layer.
pub struct StorageBuilder {
    db_path: PathBuf,
    channel_capacity: usize,
}

impl StorageBuilder {
    /// Create a new storage builder for the given database file.
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Set the channel capacity for writer commands.
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Build the storage layer and return handles.
    ///
    /// Opens or creates the database, initializes the schema (idempotent)
    /// and spawns the writer actor.
    pub async fn build(self) -> Result<StorageHandles, StoreError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = self.db_path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Unavailable(format!(
                    "failed to create database directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let pool = SqlitePool::connect(&self.db_path).await?;
        init_schema(pool.inner()).await?;

        let (actor_handle, tx) = DbActor::spawn(pool.clone(), self.channel_capacity).await?;

        tracing::debug!(path = %self.db_path.display(), "Storage ready");

        Ok(StorageHandles {
            writer: SampleWriter::new(tx),
            reader: SampleReader::new(pool.clone()),
            pool,
            actor_handle: Some(actor_handle),
        })
    }
}

/// Handles to the storage layer facades.
pub struct StorageHandles {
    /// Append facade, handed to the collector.
    pub writer: SampleWriter,
    /// Latest-sample facade, handed to the query service.
    pub reader: SampleReader,
    pool: SqlitePool,
    /// Internal actor handle for graceful shutdown.
    actor_handle: Option<JoinHandle<()>>,
}

impl StorageHandles {
    /// Gracefully shutdown the storage layer.
    ///
    /// Stops the writer actor after it has drained queued appends, waits for
    /// it to finish, then closes the pool.
    pub async fn shutdown(mut self) -> Result<(), StoreError> {
        // A closed channel means the actor already exited.
        let _ = self.writer.shutdown().await;

        if let Some(handle) = self.actor_handle.take() {
            handle
                .await
                .map_err(|e| StoreError::Unavailable(format!("failed to join writer actor: {e}")))?;
        }

        self.pool.close().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::RawMetrics;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_builder_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested").join("deeper").join("samples.db");

        let handles = StorageBuilder::new(&db_path).build().await.unwrap();
        assert!(db_path.exists());

        handles.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_reopen_preserves_data() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("reopen.db");

        let first = {
            let handles = StorageBuilder::new(&db_path).build().await.unwrap();
            let stored = handles
                .writer
                .append(RawMetrics::default().with_block_height(820_000))
                .await
                .unwrap();
            handles.shutdown().await.unwrap();
            stored
        };

        // Second initialization against the same file
        let handles = StorageBuilder::new(&db_path)
            .channel_capacity(4)
            .build()
            .await
            .unwrap();
        let latest = handles.reader.latest().await.unwrap().unwrap();
        assert_eq!(latest, first);

        let next = handles
            .writer
            .append(RawMetrics::default().with_block_height(820_001))
            .await
            .unwrap();
        assert!(next.sequence_id > first.sequence_id);
        assert!(next.observed_at >= first.observed_at);

        handles.shutdown().await.unwrap();
    }
}
