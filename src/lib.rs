//! blockwatch - Blockchain Metrics Sampler
//!
//! Periodically samples blockchain metrics (block height, network hash rate,
//! difficulty, mempool size) from an external probe, stores every sample in an
//! append-only SQLite log, and serves the latest one over HTTP.
//!
//! # Architecture
//!
//! - **Probe**: Runs the external metrics program and parses its output
//! - **Storage**: Single-writer, multi-reader SQLite sample log
//! - **Collector**: Cancellable fetch → validate → append loop
//! - **Query / Server**: Latest-sample JSON API
//!
//! # Example
//!
//! ```rust,no_run
//! use blockwatch::{AppState, Collector, CommandProbe, QueryService, StorageBuilder, create_router};
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let handles = StorageBuilder::new("data/blockchain.db").build().await?;
//!     let cancel = CancellationToken::new();
//!
//!     let collector = Collector::new(
//!         CommandProbe::new("bin/chain-probe"),
//!         handles.writer.clone(),
//!         Duration::from_secs(60),
//!     );
//!     let task = collector.spawn(cancel.clone());
//!
//!     let app = create_router(AppState { query: QueryService::new(handles.reader.clone()) });
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//!     axum::serve(listener, app).await?;
//!
//!     cancel.cancel();
//!     task.await?;
//!     handles.shutdown().await?;
//!     Ok(())
//! }
//! ```

pub mod collector;
pub mod config;
pub mod probe;
pub mod query;
pub mod server;
pub mod storage;

pub use collector::{Collector, CycleOutcome};
pub use config::{AppConfig, ConfigError};
pub use probe::{CommandProbe, MetricsSource, ProbeError};
pub use query::{BlockHeightResponse, LatestMetricsResponse, QueryService};
pub use server::{AppState, create_router};
pub use storage::{
    RawMetrics, Sample, SampleReader, SampleWriter, StorageBuilder, StorageHandles, StoreError,
};
