//! Interface traffic metrics.
//!
//! Counters for bytes, packets, errors and drops per direction, plus the
//! link state and MTU of every interface the device reports.
//!
//! Labels: name, address, interface, type, comment

use crate::context::CollectorContext;
use crate::convert::Converter;
use crate::error::{MultiError, Result};
use crate::metrics::{device_labels, PropertyMetric, PropertyMetricList, LABEL_INTERFACE};
use crate::registry::{Collector, CollectorRegistry};

const PREFIX: &str = "interface";

const COUNTERS: [&str; 8] = [
    "rx-byte", "tx-byte", "rx-packet", "tx-packet", "rx-error", "tx-error", "rx-drop", "tx-drop",
];

pub fn register(registry: &mut CollectorRegistry) -> Result<()> {
    registry.register(
        "interface",
        InterfaceCollector::factory,
        "retrieves interface traffic and link metrics",
    )
}

pub struct InterfaceCollector {
    metrics: PropertyMetricList,
    proplist: String,
}

impl InterfaceCollector {
    pub fn new() -> Result<Self> {
        let labels = device_labels(&[LABEL_INTERFACE, "type", "comment"]);

        let mut metrics = Vec::with_capacity(COUNTERS.len() + 2);
        for property in COUNTERS {
            metrics.push(
                PropertyMetric::counter(PREFIX, property, &labels)
                    .with_name(&format!("{}s_total", property))
                    .build()?,
            );
        }
        metrics.push(
            PropertyMetric::gauge(PREFIX, "running", &labels)
                .with_help("Whether the interface link is running (1 = running)")
                .with_conversion(Converter::Bool)
                .build()?,
        );
        metrics.push(PropertyMetric::gauge(PREFIX, "actual-mtu", &labels).build()?);

        let metrics = PropertyMetricList::new(metrics)?;
        let proplist = ["name", "type", "comment", "disabled"]
            .into_iter()
            .chain(metrics.iter().map(|m| m.property()))
            .collect::<Vec<_>>()
            .join(",");

        Ok(Self { metrics, proplist })
    }

    fn factory() -> Result<Box<dyn Collector>> {
        Ok(Box::new(Self::new()?))
    }
}

impl Collector for InterfaceCollector {
    fn describe(&self, registry: &prometheus::Registry) -> Result<()> {
        self.metrics.describe(registry)
    }

    fn collect(&self, ctx: &CollectorContext<'_>) -> Result<()> {
        let proplist = format!("=.proplist={}", self.proplist);
        let reply = ctx
            .client
            .run("/interface/print", &[proplist.as_str()])
            .map_err(|e| e.context("fetch interfaces error"))?;

        let mut errs = MultiError::new();
        for row in &reply.rows {
            let Some(name) = row.get("name").filter(|n| !n.is_empty()) else {
                continue;
            };
            if row.get("disabled").map(String::as_str) == Some("true") {
                continue;
            }

            let kind = row.get("type").map(String::as_str).unwrap_or("");
            let comment = row.get("comment").map(String::as_str).unwrap_or("");
            let ictx = ctx.with_labels([name.as_str(), kind, comment]);

            errs.append(
                self.metrics
                    .collect(row, &ictx)
                    .map_err(|e| e.context(format!("collect interface {} error", name))),
            );
        }

        errs.into_result()
    }

    fn reset(&self) {
        self.metrics.reset();
    }
}
