use crate::collector::CollectorSet;
use crate::error::{HoststatError, Result};
use prometheus::{Encoder, TextEncoder};
use std::time::Duration;
use tracing::info;

/// Pull-style exporter: every scrape runs one collection cycle across the
/// enabled collectors and renders the registry in text exposition format.
pub struct PrometheusExporter {
    collectors: CollectorSet,
}

impl PrometheusExporter {
    pub fn new(collectors: CollectorSet) -> Self {
        Self { collectors }
    }

    pub fn collectors(&self) -> &CollectorSet {
        &self.collectors
    }

    /// One collection cycle followed by text encoding.
    pub async fn scrape(&self) -> Result<String> {
        self.collectors.update_all().await;
        self.encode()
    }

    fn encode(&self) -> Result<String> {
        let families = self.collectors.gather();
        let mut out = Vec::new();
        TextEncoder::new().encode(&families, &mut out)?;
        String::from_utf8(out).map_err(|e| HoststatError::Metrics(e.to_string()))
    }

    /// Periodic scrape loop writing the exposition to stdout until
    /// interrupted.
    pub async fn run(&self, interval: Duration) -> Result<()> {
        info!(
            "scraping every {}s, press Ctrl+C to stop",
            interval.as_secs()
        );

        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("shutdown signal received");
                    break;
                }
                _ = ticker.tick() => {
                    let text = self.scrape().await?;
                    print!("{text}");
                }
            }
        }
        Ok(())
    }
}
