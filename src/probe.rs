//! Probe Layer
//!
//! Obtains one metrics reading from an external source.
//!
//! # Architecture
//!
//! - [`MetricsSource`]: Capability trait the collector depends on
//! - [`CommandProbe`]: Runs an external program and parses its stdout
//! - [`parse_output`]: The `key: value` line format shared by command probes
//!
//! # Example
//!
//! ```rust,no_run
//! use blockwatch::probe::{CommandProbe, MetricsSource};
//!
//! # async fn run() -> Result<(), blockwatch::probe::ProbeError> {
//! let probe = CommandProbe::new("bin/chain-probe");
//! let reading = probe.fetch().await?;
//! println!("height: {:?}", reading.block_height);
//! # Ok(())
//! # }
//! ```

mod command;
mod parser;
mod traits;

pub use command::CommandProbe;
pub use parser::{MetricKey, parse_output};
pub use traits::{MetricsSource, ProbeError};
