//! Property-to-metric mapping.
//!
//! A [`PropertyMetric`] describes how one RouterOS property becomes one
//! Prometheus series: its name, kind, label schema and value converter.
//! Feature collectors group descriptors that share a label schema into a
//! [`PropertyMetricList`] and feed it one reply row at a time.

use crate::client::PropertyMap;
use crate::context::CollectorContext;
use crate::convert::Converter;
use crate::error::{ExporterError, MultiError, ParseValueError, Result};
use prometheus::{CounterVec, GaugeVec, Opts, Registry};
use tracing::debug;

/// Device name label, first label of every collector schema.
pub const LABEL_NAME: &str = "name";
/// Device address label, second label of every collector schema.
pub const LABEL_ADDRESS: &str = "address";
pub const LABEL_INTERFACE: &str = "interface";

/// Label schema starting with the device labels followed by `extra`.
pub fn device_labels(extra: &[&str]) -> Vec<String> {
    [LABEL_NAME, LABEL_ADDRESS]
        .iter()
        .chain(extra)
        .map(|label| label.to_string())
        .collect()
}

/// Prometheus metric type of a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Gauge,
    Counter,
}

#[derive(Clone)]
enum MetricVec {
    Gauge(GaugeVec),
    Counter(CounterVec),
}

/// Immutable definition of one exported series family.
#[derive(Clone)]
pub struct PropertyMetric {
    property: String,
    name: String,
    kind: MetricKind,
    label_names: Vec<String>,
    converter: Converter,
    vec: MetricVec,
}

impl PropertyMetric {
    /// Start a gauge for `property`, named `<prefix>_<property>`.
    pub fn gauge(prefix: &str, property: &str, label_names: &[impl AsRef<str>]) -> PropertyMetricBuilder {
        PropertyMetricBuilder::new(MetricKind::Gauge, prefix, property, label_names)
    }

    /// Start a counter for `property`, named `<prefix>_<property>`.
    pub fn counter(prefix: &str, property: &str, label_names: &[impl AsRef<str>]) -> PropertyMetricBuilder {
        PropertyMetricBuilder::new(MetricKind::Counter, prefix, property, label_names)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reply property this metric reads.
    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    pub fn label_names(&self) -> &[String] {
        &self.label_names
    }

    /// Register the series family with `registry`.
    pub fn describe(&self, registry: &Registry) -> Result<()> {
        let collector: Box<dyn prometheus::core::Collector> = match &self.vec {
            MetricVec::Gauge(vec) => Box::new(vec.clone()),
            MetricVec::Counter(vec) => Box::new(vec.clone()),
        };
        registry
            .register(collector)
            .map_err(|e| ExporterError::Metrics(format!("register {}: {}", self.name, e)))
    }

    /// Convert this metric's property from `row` and record it under the
    /// context labels.
    ///
    /// Returns `Ok(false)` when the property is missing. Present values,
    /// empty ones included, always go through the converter.
    ///
    /// # Panics
    ///
    /// Panics when the context label count differs from the schema length.
    pub fn collect(&self, row: &PropertyMap, ctx: &CollectorContext<'_>) -> Result<bool> {
        let labels = ctx.labels();
        assert_eq!(
            labels.len(),
            self.label_names.len(),
            "metric {} expects labels {:?}, context supplied {:?}",
            self.name,
            self.label_names,
            labels
        );

        let Some(value) = row.get(&self.property) else {
            return Ok(false);
        };

        let converted = self
            .converter
            .convert(value)
            .map_err(|source| self.conversion_error(value, source))?;

        let labels: Vec<&str> = labels.iter().map(String::as_str).collect();
        match &self.vec {
            MetricVec::Gauge(vec) => vec.with_label_values(&labels).set(converted),
            MetricVec::Counter(vec) => {
                if converted.is_nan() || converted < 0.0 {
                    return Err(self.conversion_error(
                        value,
                        ParseValueError::Custom("counter value must be a non-negative number".to_string()),
                    ));
                }
                // counters only grow; drop the old child so the device value is taken as-is
                let _ = vec.remove_label_values(&labels);
                vec.with_label_values(&labels).inc_by(converted);
            }
        }

        Ok(true)
    }

    /// Drop every recorded series.
    pub fn reset(&self) {
        match &self.vec {
            MetricVec::Gauge(vec) => vec.reset(),
            MetricVec::Counter(vec) => vec.reset(),
        }
    }

    fn conversion_error(&self, value: &str, source: ParseValueError) -> ExporterError {
        ExporterError::Conversion {
            property: self.property.clone(),
            value: value.to_string(),
            source,
        }
    }
}

impl std::fmt::Debug for PropertyMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyMetric")
            .field("name", &self.name)
            .field("property", &self.property)
            .field("kind", &self.kind)
            .field("label_names", &self.label_names)
            .field("converter", &self.converter)
            .finish()
    }
}

/// Builder for [`PropertyMetric`].
///
/// Every method consumes and returns the builder, so a partially configured
/// builder can be cloned to derive several descriptors.
#[derive(Debug, Clone)]
pub struct PropertyMetricBuilder {
    kind: MetricKind,
    prefix: String,
    property: String,
    name: Option<String>,
    help: Option<String>,
    label_names: Vec<String>,
    converter: Converter,
}

impl PropertyMetricBuilder {
    pub fn new(kind: MetricKind, prefix: &str, property: &str, label_names: &[impl AsRef<str>]) -> Self {
        Self {
            kind,
            prefix: prefix.to_string(),
            property: property.to_string(),
            name: None,
            help: None,
            label_names: label_names.iter().map(|l| l.as_ref().to_string()).collect(),
            converter: Converter::Numeric,
        }
    }

    /// Replace the property-derived name suffix.
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }

    /// Convert values with a custom function.
    pub fn with_converter<F>(self, f: F) -> Self
    where
        F: Fn(&str) -> std::result::Result<f64, ParseValueError> + Send + Sync + 'static,
    {
        self.with_conversion(Converter::custom(f))
    }

    /// Convert values with one of the predefined strategies.
    pub fn with_conversion(mut self, converter: Converter) -> Self {
        self.converter = converter;
        self
    }

    /// Full metric name, `<prefix>_<suffix>` with dashes mapped to underscores.
    pub fn metric_name(&self) -> String {
        let suffix = self.name.as_deref().unwrap_or(&self.property);
        format!("{}_{}", self.prefix, suffix).replace('-', "_")
    }

    pub fn build(self) -> Result<PropertyMetric> {
        let name = self.metric_name();
        let help = self
            .help
            .unwrap_or_else(|| format!("Value of the RouterOS {} property", self.property));
        let opts = Opts::new(name.as_str(), help);
        let labels: Vec<&str> = self.label_names.iter().map(String::as_str).collect();

        let vec = match self.kind {
            MetricKind::Gauge => GaugeVec::new(opts, &labels).map(MetricVec::Gauge),
            MetricKind::Counter => CounterVec::new(opts, &labels).map(MetricVec::Counter),
        }
        .map_err(|e| ExporterError::Metrics(format!("build {}: {}", name, e)))?;

        Ok(PropertyMetric {
            property: self.property,
            name,
            kind: self.kind,
            label_names: self.label_names,
            converter: self.converter,
            vec,
        })
    }
}

/// Ordered descriptors sharing one label schema.
#[derive(Debug, Clone, Default)]
pub struct PropertyMetricList {
    metrics: Vec<PropertyMetric>,
}

impl PropertyMetricList {
    /// Bundle `metrics`, rejecting descriptors whose label schemas differ.
    pub fn new(metrics: Vec<PropertyMetric>) -> Result<Self> {
        if let Some(first) = metrics.first() {
            if let Some(other) = metrics
                .iter()
                .find(|m| m.label_names != first.label_names)
            {
                return Err(ExporterError::Metrics(format!(
                    "{} labels {:?} differ from {} labels {:?}",
                    other.name, other.label_names, first.name, first.label_names
                )));
            }
        }
        Ok(Self { metrics })
    }

    pub fn iter(&self) -> impl Iterator<Item = &PropertyMetric> {
        self.metrics.iter()
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Schema shared by every descriptor; empty for an empty list.
    pub fn label_names(&self) -> &[String] {
        self.metrics
            .first()
            .map(|m| m.label_names.as_slice())
            .unwrap_or(&[])
    }

    pub fn describe(&self, registry: &Registry) -> Result<()> {
        for metric in &self.metrics {
            metric.describe(registry)?;
        }
        Ok(())
    }

    /// Emit every descriptor whose property is present in `row`.
    ///
    /// Conversion failures do not stop the remaining descriptors; they are
    /// returned together once the whole row has been processed.
    ///
    /// # Panics
    ///
    /// Panics when the context label count differs from the list's schema.
    pub fn collect(&self, row: &PropertyMap, ctx: &CollectorContext<'_>) -> Result<()> {
        let schema = self.label_names();
        assert!(
            self.metrics.is_empty() || ctx.labels().len() == schema.len(),
            "label schema {:?} does not match context labels {:?}",
            schema,
            ctx.labels()
        );

        let mut errs = MultiError::new();
        let mut emitted = 0;
        for metric in &self.metrics {
            if let Some(true) = errs.append(metric.collect(row, ctx)) {
                emitted += 1;
            }
        }

        debug!(
            "Emitted {} of {} metrics for {:?} ({} failed)",
            emitted,
            self.metrics.len(),
            ctx.labels(),
            errs.len()
        );
        errs.into_result()
    }

    pub fn reset(&self) {
        for metric in &self.metrics {
            metric.reset();
        }
    }
}
