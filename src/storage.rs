//! Storage Layer
//!
//! Append-only SQLite log of blockchain samples with read/write separation:
//! - **Writer**: Async actor task that owns all inserts, fed through a tokio mpsc channel
//! - **Reader**: Connection pool for concurrent "latest sample" reads
//!
//! # Components
//!
//! - [`SampleWriter`]: Append facade; each append is acknowledged only after commit
//! - [`SampleReader`]: Latest-sample query facade
//! - [`StorageBuilder`] / [`StorageHandles`]: Initialization and lifecycle management

mod actor;
mod builder;
pub mod db;
mod error;
mod facades;
mod schema;
mod types;

pub use builder::{DEFAULT_CHANNEL_CAPACITY, StorageBuilder, StorageHandles};
pub use error::StoreError;
pub use facades::{SampleReader, SampleWriter};
pub use schema::init_schema;
pub use types::{RawMetrics, Sample};
