//! Collector Layer
//!
//! Drives the sampling cadence: probe → validate → persist, one cycle at a
//! time, until cancelled. Failures end the current cycle only.
//!
//! # Example
//!
//! ```rust,no_run
//! use blockwatch::{Collector, CommandProbe, StorageBuilder};
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let handles = StorageBuilder::new("data/blockchain.db").build().await?;
//! let probe = CommandProbe::new("bin/chain-probe");
//! let collector = Collector::new(probe, handles.writer.clone(), Duration::from_secs(60));
//!
//! let cancel = CancellationToken::new();
//! let task = collector.spawn(cancel.clone());
//! // ... later
//! cancel.cancel();
//! task.await?;
//! # Ok(())
//! # }
//! ```

mod runner;

pub use runner::{Collector, CycleOutcome, DEFAULT_INTERVAL, validate};
