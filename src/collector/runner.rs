//! Collector loop bridging a [`MetricsSource`] to the sample store.

use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::probe::{MetricsSource, ProbeError};
use crate::storage::{RawMetrics, Sample, SampleWriter, StoreError};

/// Default spacing between cycles (60 seconds).
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

/// Result of one collection cycle.
#[derive(Debug)]
pub enum CycleOutcome {
    /// Reading persisted.
    Stored(Sample),
    /// Probe or validation failed; nothing was written.
    ProbeFailed(ProbeError),
    /// Reading obtained but the append failed; the reading is dropped.
    StoreFailed(StoreError),
}

impl CycleOutcome {
    /// True when the reading was persisted.
    pub fn is_stored(&self) -> bool {
        matches!(self, Self::Stored(_))
    }
}

/// Check a reading from any source before it is persisted.
///
/// Integer fields are unsigned by type; floats must be finite and
/// non-negative.
pub fn validate(metrics: &RawMetrics) -> Result<(), ProbeError> {
    let floats = [
        ("network_hash_rate", metrics.network_hash_rate),
        ("difficulty", metrics.difficulty),
    ];

    for (key, value) in floats {
        if let Some(v) = value
            && !(v.is_finite() && v.is_sign_positive())
        {
            return Err(ProbeError::MalformedField {
                key: key.to_string(),
                value: v.to_string(),
            });
        }
    }

    Ok(())
}

/// Periodic collector.
///
/// Runs `fetch → validate → append` once per cycle and sleeps `interval`
/// after each cycle, so the effective period is `interval + cycle duration`.
/// At most one fetch is ever in flight.
pub struct Collector<S> {
    source: S,
    writer: SampleWriter,
    interval: Duration,
}

impl<S> std::fmt::Debug for Collector<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collector")
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

impl<S: MetricsSource> Collector<S> {
    /// Create a collector.
    pub fn new(source: S, writer: SampleWriter, interval: Duration) -> Self {
        Self {
            source,
            writer,
            interval,
        }
    }

    /// Spacing between cycles.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run the loop on a new Tokio task.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(cancel).await })
    }

    /// Run cycles until `cancel` fires.
    ///
    /// Cancellation is observed while waiting between cycles and while a
    /// fetch is in flight (the fetch is dropped). An append that has started
    /// is always allowed to finish.
    pub async fn run(&self, cancel: CancellationToken) {
        tracing::info!(
            source = %self.source.name(),
            interval = ?self.interval,
            "Collector started"
        );

        loop {
            let started = Instant::now();

            let fetched = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                fetched = self.fetch_validated() => fetched,
            };
            let outcome = self.persist(fetched).await;
            self.log_outcome(&outcome, started.elapsed());

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        tracing::info!(source = %self.source.name(), "Collector stopped");
    }

    /// Perform one cycle without sleeping.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let fetched = self.fetch_validated().await;
        self.persist(fetched).await
    }

    async fn fetch_validated(&self) -> Result<RawMetrics, ProbeError> {
        let metrics = self.source.fetch().await?;
        validate(&metrics)?;
        Ok(metrics)
    }

    async fn persist(&self, fetched: Result<RawMetrics, ProbeError>) -> CycleOutcome {
        match fetched {
            Ok(metrics) => match self.writer.append(metrics).await {
                Ok(sample) => CycleOutcome::Stored(sample),
                Err(e) => CycleOutcome::StoreFailed(e),
            },
            Err(e) => CycleOutcome::ProbeFailed(e),
        }
    }

    fn log_outcome(&self, outcome: &CycleOutcome, elapsed: Duration) {
        let duration_ms = elapsed.as_millis();
        match outcome {
            CycleOutcome::Stored(sample) => tracing::debug!(
                source = %self.source.name(),
                sequence_id = sample.sequence_id,
                block_height = ?sample.block_height,
                duration_ms,
                "Collection succeeded"
            ),
            CycleOutcome::ProbeFailed(e) => tracing::warn!(
                source = %self.source.name(),
                error = %e,
                duration_ms,
                "Probe failed, skipping cycle"
            ),
            CycleOutcome::StoreFailed(e) => tracing::error!(
                source = %self.source.name(),
                error = %e,
                duration_ms,
                "Append failed, sample dropped"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageBuilder;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;

    /// Source that replays canned results, then reports `NoData`.
    #[derive(Clone, Default)]
    struct ScriptedSource {
        script: Arc<Mutex<VecDeque<Result<RawMetrics, ProbeError>>>>,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<RawMetrics, ProbeError>>) -> Self {
            Self {
                script: Arc::new(Mutex::new(script.into())),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl MetricsSource for ScriptedSource {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn fetch(&self) -> Result<RawMetrics, ProbeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(ProbeError::NoData))
        }
    }

    /// Source whose fetch never completes.
    struct HangingSource;

    #[async_trait::async_trait]
    impl MetricsSource for HangingSource {
        fn name(&self) -> &str {
            "hanging"
        }

        async fn fetch(&self) -> Result<RawMetrics, ProbeError> {
            std::future::pending::<Result<RawMetrics, ProbeError>>().await
        }
    }

    fn reading(height: u64) -> RawMetrics {
        RawMetrics::default()
            .with_block_height(height)
            .with_network_hash_rate(450.5)
            .with_difficulty(6.0e13)
            .with_mempool_size(1200)
    }

    #[test]
    fn test_validate() {
        assert!(validate(&reading(1)).is_ok());
        assert!(validate(&RawMetrics::default()).is_ok());
        assert!(validate(&RawMetrics::default().with_difficulty(-1.0)).is_err());
        assert!(validate(&RawMetrics::default().with_difficulty(-0.0)).is_err());
        assert!(validate(&RawMetrics::default().with_difficulty(0.0)).is_ok());
        assert!(validate(&RawMetrics::default().with_network_hash_rate(f64::NAN)).is_err());
        assert!(validate(&RawMetrics::default().with_network_hash_rate(f64::INFINITY)).is_err());
    }

    #[tokio::test]
    async fn test_cycle_stores_reading() {
        let dir = tempdir().unwrap();
        let handles = StorageBuilder::new(dir.path().join("cycle.db"))
            .build()
            .await
            .unwrap();

        let source = ScriptedSource::new(vec![Ok(reading(820_000))]);
        let collector = Collector::new(source, handles.writer.clone(), DEFAULT_INTERVAL);

        let outcome = collector.run_cycle().await;
        let CycleOutcome::Stored(stored) = outcome else {
            panic!("expected Stored, got {outcome:?}");
        };

        let latest = handles.reader.latest().await.unwrap().unwrap();
        assert_eq!(latest, stored);
        assert_eq!(latest.metrics(), reading(820_000));

        handles.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_probe_leaves_latest_unchanged() {
        let dir = tempdir().unwrap();
        let handles = StorageBuilder::new(dir.path().join("failed.db"))
            .build()
            .await
            .unwrap();

        let source = ScriptedSource::new(vec![
            Ok(reading(1)),
            Err(ProbeError::ProcessFailed("connection refused".to_string())),
            Err(ProbeError::MalformedLine {
                line: 1,
                content: "garbage".to_string(),
            }),
        ]);
        let collector = Collector::new(source, handles.writer.clone(), DEFAULT_INTERVAL);

        assert!(collector.run_cycle().await.is_stored());
        let before = handles.reader.latest().await.unwrap().unwrap();

        for _ in 0..2 {
            let outcome = collector.run_cycle().await;
            assert!(matches!(outcome, CycleOutcome::ProbeFailed(_)));
            assert_eq!(handles.reader.latest().await.unwrap().unwrap(), before);
        }

        handles.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_reading_is_not_persisted() {
        let dir = tempdir().unwrap();
        let handles = StorageBuilder::new(dir.path().join("invalid.db"))
            .build()
            .await
            .unwrap();

        let source = ScriptedSource::new(vec![Ok(RawMetrics::default().with_difficulty(-5.0))]);
        let collector = Collector::new(source, handles.writer.clone(), DEFAULT_INTERVAL);

        let outcome = collector.run_cycle().await;
        assert!(matches!(
            outcome,
            CycleOutcome::ProbeFailed(ProbeError::MalformedField { .. })
        ));
        assert!(handles.reader.latest().await.unwrap().is_none());

        handles.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_store_failure_does_not_stop_loop() {
        let dir = tempdir().unwrap();
        let handles = StorageBuilder::new(dir.path().join("store_down.db"))
            .build()
            .await
            .unwrap();
        let writer = handles.writer.clone();
        handles.shutdown().await.unwrap();

        let source = ScriptedSource::new(vec![Ok(reading(1)), Ok(reading(2)), Ok(reading(3))]);
        let collector = Collector::new(source.clone(), writer, Duration::from_millis(5));

        let outcome = collector.run_cycle().await;
        assert!(matches!(
            outcome,
            CycleOutcome::StoreFailed(StoreError::Unavailable(_))
        ));

        let cancel = CancellationToken::new();
        let task = collector.spawn(cancel.clone());
        while source.calls() < 3 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        cancel.cancel();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_loop_persists_each_cycle() {
        let dir = tempdir().unwrap();
        let handles = StorageBuilder::new(dir.path().join("loop.db"))
            .build()
            .await
            .unwrap();

        let source = ScriptedSource::new(vec![
            Ok(reading(1)),
            Err(ProbeError::NoData),
            Ok(reading(2)),
            Ok(reading(3)),
        ]);
        let collector = Collector::new(
            source.clone(),
            handles.writer.clone(),
            Duration::from_millis(10),
        );

        let cancel = CancellationToken::new();
        let task = collector.spawn(cancel.clone());
        while source.calls() < 4 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        cancel.cancel();
        task.await.unwrap();

        let latest = handles.reader.latest().await.unwrap().unwrap();
        assert_eq!(latest.block_height, Some(3));
        assert_eq!(latest.sequence_id, 3);

        handles.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_cadence_with_paused_clock() {
        let dir = tempdir().unwrap();
        let handles = StorageBuilder::new(dir.path().join("cadence.db"))
            .build()
            .await
            .unwrap();

        // Every fetch fails, so the store is never touched while time is paused.
        let source = ScriptedSource::new(Vec::new());
        let collector = Collector::new(source.clone(), handles.writer.clone(), DEFAULT_INTERVAL);

        tokio::time::pause();
        let cancel = CancellationToken::new();
        let task = collector.spawn(cancel.clone());

        // Cycles at t=0, 60s and 120s.
        tokio::time::sleep(Duration::from_secs(150)).await;
        assert_eq!(source.calls(), 3);

        cancel.cancel();
        task.await.unwrap();
        assert_eq!(source.calls(), 3);

        tokio::time::resume();
        handles.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_before_start_never_fetches() {
        let dir = tempdir().unwrap();
        let handles = StorageBuilder::new(dir.path().join("precancel.db"))
            .build()
            .await
            .unwrap();

        let source = ScriptedSource::new(vec![Ok(reading(1))]);
        let collector = Collector::new(source.clone(), handles.writer.clone(), DEFAULT_INTERVAL);

        let cancel = CancellationToken::new();
        cancel.cancel();
        collector.run(cancel).await;

        assert_eq!(source.calls(), 0);
        assert!(handles.reader.latest().await.unwrap().is_none());

        handles.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_cancel_interrupts_inflight_fetch() {
        let dir = tempdir().unwrap();
        let handles = StorageBuilder::new(dir.path().join("inflight.db"))
            .build()
            .await
            .unwrap();

        let collector = Collector::new(HangingSource, handles.writer.clone(), DEFAULT_INTERVAL);
        let cancel = CancellationToken::new();
        let task = collector.spawn(cancel.clone());

        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("collector did not stop")
            .unwrap();

        handles.shutdown().await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancel_kills_running_command() {
        use crate::probe::CommandProbe;
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let handles = StorageBuilder::new(dir.path().join("kill.db"))
            .build()
            .await
            .unwrap();

        let marker = dir.path().join("finished");
        let script = dir.path().join("slow-probe.sh");
        std::fs::write(
            &script,
            format!(
                "#!/bin/sh\nsleep 2\ntouch '{}'\necho 'block_height: 1'\n",
                marker.display()
            ),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let collector = Collector::new(
            CommandProbe::new(&script),
            handles.writer.clone(),
            DEFAULT_INTERVAL,
        );
        let cancel = CancellationToken::new();
        let task = collector.spawn(cancel.clone());

        tokio::time::sleep(Duration::from_millis(300)).await;
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("collector did not stop")
            .unwrap();

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert!(!marker.exists());
        assert!(handles.reader.latest().await.unwrap().is_none());

        handles.shutdown().await.unwrap();
    }
}
