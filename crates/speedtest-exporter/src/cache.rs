//! Measurement cache.
//!
//! Decides per scrape whether the stored result is still valid or a new probe
//! has to run. The check, the probe run and the store happen under a single
//! async mutex, so concurrent scrapes never start overlapping runs: callers
//! that queued behind an in-flight run get that run's result.
//!
//! The run itself is a spawned task that owns the lock guard. A scrape that
//! goes away (client disconnect, scrape timeout) stops waiting but the run
//! still finishes, stores its entry and publishes.
//!
//! Failed runs are cached for the full duration, same as successful ones.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use speedtest_core::measurement::format_megabits;
use speedtest_core::{parser, MeasurementResult};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio_util::sync::CancellationToken;

use crate::obs::metrics::ExporterMetrics;
use crate::probe::{Probe, ProbeInvocationConfig};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheEntry {
    pub result: MeasurementResult,
    pub valid_until: Instant,
}

impl CacheEntry {
    /// Fresh strictly before `valid_until`.
    pub fn is_fresh(&self, now: Instant) -> bool {
        now < self.valid_until
    }
}

#[derive(Clone)]
pub struct MeasurementCache {
    inner: Arc<CacheInner>,
}

struct CacheInner {
    probe: Arc<dyn Probe>,
    probe_cfg: ProbeInvocationConfig,
    ttl: Duration,
    metrics: Arc<ExporterMetrics>,
    shutdown: CancellationToken,
    /// `None` until the first run: stale.
    slot: Arc<Mutex<Option<CacheEntry>>>,
    /// Completed runs, bumped while the slot lock is held.
    completed: AtomicU64,
}

impl MeasurementCache {
    pub fn new(
        probe: Arc<dyn Probe>,
        probe_cfg: ProbeInvocationConfig,
        ttl: Duration,
        metrics: Arc<ExporterMetrics>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                probe,
                probe_cfg,
                ttl,
                metrics,
                shutdown,
                slot: Arc::new(Mutex::new(None)),
                completed: AtomicU64::new(0),
            }),
        }
    }

    /// Number of probe runs completed so far.
    pub fn runs_completed(&self) -> u64 {
        self.inner.completed.load(Ordering::Acquire)
    }

    /// [`get_current`](Self::get_current) at the current instant.
    pub async fn current(&self) -> MeasurementResult {
        self.get_current(Instant::now()).await
    }

    /// Serve the cached result, or measure when stale.
    ///
    /// Never fails: every probe failure has already become the sentinel.
    /// Once shutdown is signalled no probe is started and every caller,
    /// including ones waiting on a run, gets the sentinel right away.
    pub async fn get_current(&self, now: Instant) -> MeasurementResult {
        let inner = &self.inner;
        if inner.shutdown.is_cancelled() {
            return inner.short_circuit();
        }

        let seen = inner.completed.load(Ordering::Acquire);
        let slot = tokio::select! {
            biased;
            _ = inner.shutdown.cancelled() => return inner.short_circuit(),
            guard = Arc::clone(&inner.slot).lock_owned() => guard,
        };

        if inner.shutdown.is_cancelled() {
            return inner.short_circuit();
        }

        if let Some(entry) = slot.as_ref() {
            // a run finished while we waited for the lock
            if entry.is_fresh(now) || inner.completed.load(Ordering::Acquire) != seen {
                return entry.result;
            }
        }

        let run = tokio::spawn(Arc::clone(inner).refresh(slot, now));

        tokio::select! {
            biased;
            _ = inner.shutdown.cancelled() => inner.short_circuit(),
            joined = run => match joined {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!(error = %e, "speedtest task failed");
                    MeasurementResult::failed()
                }
            },
        }
    }

    /// The stored entry, if any run completed.
    pub async fn entry(&self) -> Option<CacheEntry> {
        *self.inner.slot.lock().await
    }
}

impl CacheInner {
    fn short_circuit(&self) -> MeasurementResult {
        tracing::debug!("shutdown in progress, skipping speedtest");
        let result = MeasurementResult::failed();
        self.metrics.snapshot.update(result);
        result
    }

    /// Runs with the slot locked for its whole duration.
    async fn refresh(
        self: Arc<Self>,
        mut slot: OwnedMutexGuard<Option<CacheEntry>>,
        now: Instant,
    ) -> MeasurementResult {
        let result = self.measure().await;
        *slot = Some(CacheEntry {
            result,
            valid_until: now + self.ttl,
        });

        // after shutdown the sentinel stays published
        let shutdown = &self.shutdown;
        self.metrics.snapshot.update_with(|| {
            if shutdown.is_cancelled() {
                MeasurementResult::failed()
            } else {
                result
            }
        });
        self.completed.fetch_add(1, Ordering::Release);

        result
    }

    async fn measure(&self) -> MeasurementResult {
        let started = Instant::now();
        self.metrics.probe_runs.inc(&[]);

        let outcome = self
            .probe
            .run(&self.probe_cfg)
            .await
            .and_then(|raw| parser::decode(&raw.stdout));

        match outcome {
            Ok(result) => {
                tracing::info!(
                    server = result.server_id,
                    jitter_ms = result.jitter_ms,
                    ping_ms = result.ping_ms,
                    download = %format_megabits(result.download_bps),
                    upload = %format_megabits(result.upload_bps),
                    elapsed = ?started.elapsed(),
                    "speedtest completed"
                );
                result
            }
            Err(e) => {
                let kind = e.kind();
                tracing::error!(
                    kind = kind.as_str(),
                    error = %e,
                    elapsed = ?started.elapsed(),
                    "speedtest failed"
                );
                self.metrics.record_failure(kind);
                MeasurementResult::failed()
            }
        }
    }
}
