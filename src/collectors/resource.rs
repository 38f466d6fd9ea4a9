//! System resource metrics (`/system/resource`).
//!
//! Labels: name, address, board_name, version

use crate::context::CollectorContext;
use crate::convert::Converter;
use crate::error::Result;
use crate::metrics::{device_labels, PropertyMetric, PropertyMetricList};
use crate::registry::{Collector, CollectorRegistry};
use tracing::debug;

const PREFIX: &str = "system_resource";

pub fn register(registry: &mut CollectorRegistry) -> Result<()> {
    registry.register(
        "resource",
        ResourceCollector::factory,
        "retrieves system resource metrics (CPU, memory, storage, uptime)",
    )
}

pub struct ResourceCollector {
    metrics: PropertyMetricList,
}

impl ResourceCollector {
    pub fn new() -> Result<Self> {
        let labels = device_labels(&["board_name", "version"]);

        let metrics = PropertyMetricList::new(vec![
            PropertyMetric::gauge(PREFIX, "cpu-load", &labels)
                .with_help("CPU load in percent")
                .build()?,
            PropertyMetric::gauge(PREFIX, "free-memory", &labels).build()?,
            PropertyMetric::gauge(PREFIX, "total-memory", &labels).build()?,
            PropertyMetric::gauge(PREFIX, "free-hdd-space", &labels).build()?,
            PropertyMetric::gauge(PREFIX, "total-hdd-space", &labels).build()?,
            PropertyMetric::gauge(PREFIX, "uptime", &labels)
                .with_name("uptime_seconds")
                .with_help("Device uptime in seconds")
                .with_conversion(Converter::Duration)
                .build()?,
        ])?;

        Ok(Self { metrics })
    }

    fn factory() -> Result<Box<dyn Collector>> {
        Ok(Box::new(Self::new()?))
    }
}

impl Collector for ResourceCollector {
    fn describe(&self, registry: &prometheus::Registry) -> Result<()> {
        self.metrics.describe(registry)
    }

    fn collect(&self, ctx: &CollectorContext<'_>) -> Result<()> {
        let reply = ctx
            .client
            .run("/system/resource/print", &[])
            .map_err(|e| e.context("fetch system resource error"))?;

        let Some(row) = reply.first() else {
            debug!("Empty system resource reply");
            return Ok(());
        };

        let board = row.get("board-name").map(String::as_str).unwrap_or("");
        let version = row.get("version").map(String::as_str).unwrap_or("");

        self.metrics.collect(row, &ctx.with_labels([board, version]))
    }

    fn reset(&self) {
        self.metrics.reset();
    }
}
