//! External-process metrics probe.
//!
//! Invokes a metrics binary with no arguments and no stdin, then parses its
//! stdout. Exit code 0 means success; anything else is a failure with the
//! diagnostic taken from stderr.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::probe::{MetricsSource, ProbeError, parse_output};
use crate::storage::RawMetrics;

/// Probe that shells out to an external metrics program.
#[derive(Debug, Clone)]
pub struct CommandProbe {
    program: PathBuf,
    name: String,
    timeout: Option<Duration>,
}

impl CommandProbe {
    /// Create a probe for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        let program = program.as_ref().to_path_buf();
        Self {
            name: program.display().to_string(),
            program,
            timeout: None,
        }
    }

    /// Kill the process and fail with [`ProbeError::Timeout`] after `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The program this probe runs.
    pub fn program(&self) -> &Path {
        &self.program
    }

    async fn run(&self) -> Result<std::process::Output, ProbeError> {
        let child = Command::new(&self.program)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => {
                    ProbeError::Unavailable(format!("'{}' not found", self.program.display()))
                }
                _ => ProbeError::Unavailable(format!(
                    "failed to launch '{}': {}",
                    self.program.display(),
                    e
                )),
            })?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let waited = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| ProbeError::Timeout)?,
            None => child.wait_with_output().await,
        };

        waited.map_err(|e| {
            ProbeError::Unavailable(format!(
                "failed to read output of '{}': {}",
                self.program.display(),
                e
            ))
        })
    }
}

#[async_trait::async_trait]
impl MetricsSource for CommandProbe {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<RawMetrics, ProbeError> {
        let output = self.run().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::debug!(program = %self.name, status = %output.status, "Probe exited unsuccessfully");
            return Err(ProbeError::ProcessFailed(stderr));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_output(&stdout)
    }
}
