//! LTE interface metrics.
//!
//! # Metrics Produced
//! - `lte_interface_rssi`, `lte_interface_rsrp`, `lte_interface_rsrq`, `lte_interface_sinr`
//! - `lte_interface_connected` - 1 when the modem reports `connected`
//!
//! Labels: name, address, interface, cell_id, primary_band

use crate::context::CollectorContext;
use crate::error::{MultiError, ParseValueError, Result};
use crate::metrics::{device_labels, PropertyMetric, PropertyMetricList, LABEL_INTERFACE};
use crate::registry::{Collector, CollectorRegistry};
use tracing::debug;

const PREFIX: &str = "lte_interface";

pub fn register(registry: &mut CollectorRegistry) -> Result<()> {
    registry.register("lte", LteCollector::factory, "retrieves LTE interfaces metrics")
}

pub struct LteCollector {
    metrics: PropertyMetricList,
}

impl LteCollector {
    pub fn new() -> Result<Self> {
        let labels = device_labels(&[LABEL_INTERFACE, "cell_id", "primary_band"]);

        let metrics = PropertyMetricList::new(vec![
            PropertyMetric::gauge(PREFIX, "rssi", &labels).build()?,
            PropertyMetric::gauge(PREFIX, "rsrp", &labels).build()?,
            PropertyMetric::gauge(PREFIX, "rsrq", &labels).build()?,
            PropertyMetric::gauge(PREFIX, "sinr", &labels).build()?,
            PropertyMetric::gauge(PREFIX, "status", &labels)
                .with_name("connected")
                .with_help("Whether the LTE interface is connected (1 = connected)")
                .with_converter(connection_status)
                .build()?,
        ])?;

        Ok(Self { metrics })
    }

    fn factory() -> Result<Box<dyn Collector>> {
        Ok(Box::new(Self::new()?))
    }

    fn collect_for_interface(&self, iface: &str, ctx: &CollectorContext<'_>) -> Result<()> {
        let numbers = format!("=numbers={}", iface);
        let reply = ctx
            .client
            .run(
                "/interface/lte/monitor",
                &[
                    numbers.as_str(),
                    "=once=",
                    "=.proplist=current-cellid,primary-band,rssi,rsrp,rsrq,sinr,status",
                ],
            )
            .map_err(|e| e.context(format!("fetch {} lte interface statistics error", iface)))?;

        let Some(row) = reply.first() else {
            debug!("No LTE monitor data for {}", iface);
            return Ok(());
        };

        let cell_id = row.get("current-cellid").map(String::as_str).unwrap_or("");
        let primary_band = row
            .get("primary-band")
            .and_then(|band| band.split_whitespace().next())
            .unwrap_or("");

        let lctx = ctx.with_labels([iface, cell_id, primary_band]);

        self.metrics
            .collect(row, &lctx)
            .map_err(|e| e.context(format!("collect lte for {} error", iface)))
    }
}

impl Collector for LteCollector {
    fn describe(&self, registry: &prometheus::Registry) -> Result<()> {
        self.metrics.describe(registry)
    }

    fn collect(&self, ctx: &CollectorContext<'_>) -> Result<()> {
        let reply = ctx
            .client
            .run("/interface/lte/print", &["?disabled=false", "=.proplist=name"])
            .map_err(|e| e.context("fetch lte interface names error"))?;

        let mut errs = MultiError::new();
        for iface in reply.extract_property("name") {
            errs.append(self.collect_for_interface(&iface, ctx));
        }

        errs.into_result()
    }

    fn reset(&self) {
        self.metrics.reset();
    }
}

fn connection_status(value: &str) -> std::result::Result<f64, ParseValueError> {
    Ok(if value == "connected" { 1.0 } else { 0.0 })
}
