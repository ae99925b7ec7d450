//! Shared application state for the exporter.
//!
//! Owns the single cache/metrics pair that every scrape goes through, plus
//! the shutdown token that both the cache and the server observe.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::cache::MeasurementCache;
use crate::config::ExporterConfig;
use crate::obs::metrics::ExporterMetrics;
use crate::probe::Probe;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cache: MeasurementCache,
    metrics: Arc<ExporterMetrics>,
    shutdown: CancellationToken,
}

impl AppState {
    pub fn new(cfg: &ExporterConfig, probe: Arc<dyn Probe>, shutdown: CancellationToken) -> Self {
        let metrics = Arc::new(ExporterMetrics::new());
        let cache = MeasurementCache::new(
            probe,
            cfg.probe_config(),
            cfg.cache_duration(),
            Arc::clone(&metrics),
            shutdown.clone(),
        );

        Self {
            inner: Arc::new(AppStateInner {
                cache,
                metrics,
                shutdown,
            }),
        }
    }

    pub fn cache(&self) -> &MeasurementCache {
        &self.inner.cache
    }

    pub fn metrics(&self) -> &ExporterMetrics {
        &self.inner.metrics
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.inner.shutdown.clone()
    }

    /// True once shutdown was signalled.
    pub fn is_draining(&self) -> bool {
        self.inner.shutdown.is_cancelled()
    }
}
