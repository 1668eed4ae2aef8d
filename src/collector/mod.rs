//! Collector framework
//!
//! Collectors are constructed explicitly and handed to a [`CollectorSet`]
//! by the host process; there is no global registration side channel. Each
//! collector owns its descriptor handles and registers them once, then
//! gets polled on every scrape. A failing collector is reported through
//! the per-collector scrape metrics and the log, and never disturbs the
//! other collectors or the process.

pub mod cpu;

pub use cpu::CpuCollector;

use crate::error::{HoststatError, Result};
use crate::metrics::NAMESPACE;
use crate::sysctl::RawStatsSource;
use async_trait::async_trait;
use futures::future::join_all;
use prometheus::proto::MetricFamily;
use prometheus::{GaugeVec, Opts, Registry};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

#[async_trait]
pub trait Collector: Send + Sync {
    /// Stable name the collector is addressed by.
    fn name(&self) -> &'static str;

    /// Register the collector's descriptor handles with the registry.
    /// Called once, when the collector joins a [`CollectorSet`].
    fn register(&self, registry: &Registry) -> Result<()>;

    /// Run one collection cycle. Either every sample of the cycle is
    /// published or none is.
    async fn update(&self) -> Result<()>;
}

struct Entry {
    collector: Box<dyn Collector>,
    enabled: bool,
}

/// Explicit registration table plus the backing Prometheus registry.
pub struct CollectorSet {
    registry: Registry,
    entries: Vec<Entry>,
    scrape_success: GaugeVec,
    scrape_duration: GaugeVec,
}

impl CollectorSet {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let scrape_success = GaugeVec::new(
            Opts::new(
                "scrape_collector_success",
                "Whether the collector succeeded on the last scrape.",
            )
            .namespace(NAMESPACE),
            &["collector"],
        )?;
        let scrape_duration = GaugeVec::new(
            Opts::new(
                "scrape_collector_duration_seconds",
                "Duration of the collector's last scrape.",
            )
            .namespace(NAMESPACE),
            &["collector"],
        )?;
        registry.register(Box::new(scrape_success.clone()))?;
        registry.register(Box::new(scrape_duration.clone()))?;

        Ok(Self {
            registry,
            entries: Vec::new(),
            scrape_success,
            scrape_duration,
        })
    }

    /// A set populated with the built-in collectors reading from `source`.
    pub fn with_defaults(source: Arc<dyn RawStatsSource>) -> Result<Self> {
        let mut set = Self::new()?;

        // Self-telemetry of the exporter process where the platform
        // supports it.
        #[cfg(target_os = "linux")]
        set.registry.register(Box::new(
            prometheus::process_collector::ProcessCollector::for_self(),
        ))?;

        for (collector, enabled) in default_collectors(source)? {
            set.register(collector, enabled)?;
        }
        Ok(set)
    }

    pub fn register(&mut self, collector: Box<dyn Collector>, enabled: bool) -> Result<()> {
        collector.register(&self.registry)?;
        debug!("registered collector {}", collector.name());
        self.entries.push(Entry { collector, enabled });
        Ok(())
    }

    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> Result<()> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.collector.name() == name)
            .ok_or_else(|| HoststatError::UnknownCollector(name.to_string()))?;
        entry.enabled = enabled;
        Ok(())
    }

    /// Collector names with their enabled state, in registration order.
    pub fn statuses(&self) -> Vec<(&'static str, bool)> {
        self.entries
            .iter()
            .map(|e| (e.collector.name(), e.enabled))
            .collect()
    }

    /// Run one collection cycle across all enabled collectors. Outcomes
    /// land in the per-collector success and duration gauges; errors are
    /// logged and do not propagate.
    pub async fn update_all(&self) {
        let cycles = self
            .entries
            .iter()
            .filter(|e| e.enabled)
            .map(|e| async move {
                let start = Instant::now();
                let result = e.collector.update().await;
                (e.collector.name(), result, start.elapsed())
            });

        for (name, result, elapsed) in join_all(cycles).await {
            self.scrape_duration
                .with_label_values(&[name])
                .set(elapsed.as_secs_f64());
            match result {
                Ok(()) => {
                    self.scrape_success.with_label_values(&[name]).set(1.0);
                    debug!("collector {} succeeded in {:?}", name, elapsed);
                }
                Err(err) => {
                    self.scrape_success.with_label_values(&[name]).set(0.0);
                    warn!("collector {} failed: {}", name, err);
                }
            }
        }
    }

    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }
}

/// The built-in collector table. Adding a collector means adding a row
/// here; the host decides what to construct and with which source.
pub fn default_collectors(
    source: Arc<dyn RawStatsSource>,
) -> Result<Vec<(Box<dyn Collector>, bool)>> {
    Ok(vec![(Box::new(CpuCollector::new(source)?), true)])
}
