//! Scrape orchestration.
//!
//! The [`Exporter`] owns the Prometheus registry, one instance of every
//! enabled collector and the list of devices to poll. Each scrape resets
//! all series, polls every device on a blocking worker and encodes the
//! result in Prometheus text format.

use crate::client::{QueryClient, RestClient};
use crate::config::Settings;
use crate::context::CollectorContext;
use crate::error::{ExporterError, MultiError, Result};
use crate::metrics::{LABEL_ADDRESS, LABEL_NAME};
use crate::registry::{Collector, CollectorRegistry};
use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// A device polled on every scrape.
pub struct Target {
    pub name: String,
    pub address: String,
    pub client: Arc<dyn QueryClient>,
}

impl Target {
    pub fn new(name: &str, address: &str, client: Arc<dyn QueryClient>) -> Self {
        Self {
            name: name.to_string(),
            address: address.to_string(),
            client,
        }
    }
}

struct EnabledCollector {
    key: String,
    collector: Box<dyn Collector>,
}

/// Per-device scrape health series.
#[derive(Clone)]
struct ScrapeMetrics {
    up: GaugeVec,
    collector_success: GaugeVec,
    collector_duration: GaugeVec,
}

impl ScrapeMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let up = register_gauge_vec(
            registry,
            "mikrotik_up",
            "Whether every collector succeeded on the last scrape of the device (1 = success, 0 = failure)",
            &[LABEL_NAME, LABEL_ADDRESS],
        )?;
        let collector_success = register_gauge_vec(
            registry,
            "mikrotik_scrape_collector_success",
            "Whether a collector succeeded on the last scrape (1 = success, 0 = failure)",
            &[LABEL_NAME, LABEL_ADDRESS, "collector"],
        )?;
        let collector_duration = register_gauge_vec(
            registry,
            "mikrotik_scrape_collector_duration_seconds",
            "Duration of a collector run on the last scrape",
            &[LABEL_NAME, LABEL_ADDRESS, "collector"],
        )?;

        Ok(Self {
            up,
            collector_success,
            collector_duration,
        })
    }

    fn reset(&self) {
        self.up.reset();
        self.collector_success.reset();
        self.collector_duration.reset();
    }
}

fn register_gauge_vec(registry: &Registry, name: &str, help: &str, labels: &[&str]) -> Result<GaugeVec> {
    let vec = GaugeVec::new(Opts::new(name, help), labels)
        .map_err(|e| ExporterError::Metrics(e.to_string()))?;
    registry
        .register(Box::new(vec.clone()))
        .map_err(|e| ExporterError::Metrics(e.to_string()))?;
    Ok(vec)
}

/// Exporter state shared by all scrapes.
pub struct Exporter {
    registry: Registry,
    targets: Vec<Arc<Target>>,
    collectors: Arc<Vec<EnabledCollector>>,
    scrape: ScrapeMetrics,
    scrape_lock: tokio::sync::Mutex<()>,
}

impl Exporter {
    /// Instantiate the `enabled` collectors (all registered ones when empty)
    /// and register their series.
    pub fn new(registry: &CollectorRegistry, enabled: &[String], targets: Vec<Target>) -> Result<Self> {
        let keys: Vec<String> = if enabled.is_empty() {
            registry.keys().map(str::to_string).collect()
        } else {
            enabled.to_vec()
        };

        let prometheus_registry = Registry::new();
        let mut collectors = Vec::with_capacity(keys.len());
        for key in keys {
            let factory = registry
                .lookup(&key)
                .ok_or_else(|| ExporterError::UnknownCollector(key.clone()))?;
            let collector = factory()?;
            collector.describe(&prometheus_registry)?;
            info!("Enabled collector {}", key);
            collectors.push(EnabledCollector { key, collector });
        }

        let scrape = ScrapeMetrics::new(&prometheus_registry)?;

        #[cfg(target_os = "linux")]
        prometheus_registry
            .register(Box::new(
                prometheus::process_collector::ProcessCollector::for_self(),
            ))
            .map_err(|e| ExporterError::Metrics(e.to_string()))?;

        Ok(Self {
            registry: prometheus_registry,
            targets: targets.into_iter().map(Arc::new).collect(),
            collectors: Arc::new(collectors),
            scrape,
            scrape_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// Build REST clients for every configured device.
    ///
    /// Must not be called from within an async context: the REST client is
    /// blocking.
    pub fn from_settings(settings: &Settings, registry: &CollectorRegistry) -> Result<Self> {
        let timeout = settings.exporter.timeout();
        let targets = settings
            .devices
            .iter()
            .map(|device| {
                let client = RestClient::new(device, timeout)?;
                Ok(Target::new(&device.name, &device.address, Arc::new(client)))
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(registry, &settings.exporter.collectors, targets)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Keys of the enabled collectors, in run order.
    pub fn collector_keys(&self) -> Vec<&str> {
        self.collectors.iter().map(|c| c.key.as_str()).collect()
    }

    /// Poll every device.
    ///
    /// Devices are polled concurrently; a failing device never prevents the
    /// others from being scraped. Failures are returned together, in device
    /// order.
    pub async fn collect(&self) -> Result<()> {
        let _guard = self.scrape_lock.lock().await;
        self.poll_all().await
    }

    /// Poll every device and encode the result under one scrape lock, so a
    /// concurrent scrape cannot reset the series before they are encoded.
    ///
    /// Device failures are logged and exposed through `mikrotik_up`; only an
    /// encoding failure is returned.
    pub async fn scrape(&self) -> Result<String> {
        let _guard = self.scrape_lock.lock().await;
        if let Err(e) = self.poll_all().await {
            warn!("Failed to collect metrics: {}", e);
        }
        self.encode()
    }

    /// Callers must hold `scrape_lock`.
    async fn poll_all(&self) -> Result<()> {
        info!("Collecting metrics from {} devices", self.targets.len());

        for entry in self.collectors.iter() {
            entry.collector.reset();
        }
        self.scrape.reset();

        let handles: Vec<_> = self
            .targets
            .iter()
            .map(|target| {
                let target = Arc::clone(target);
                let collectors = Arc::clone(&self.collectors);
                let scrape = self.scrape.clone();
                tokio::task::spawn_blocking(move || poll_target(&target, &collectors, &scrape))
            })
            .collect();

        let mut errs = MultiError::new();
        for (target, handle) in self.targets.iter().zip(handles) {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(ExporterError::Other(format!("poll task failed: {}", e))),
            };
            if let Err(e) = result {
                warn!("Failed to collect metrics from {}: {}", target.name, e);
                errs.push(e.context(format!("device {}", target.name)));
            }
        }

        if errs.is_empty() {
            info!("Successfully collected metrics");
        } else {
            error!("{} of {} devices failed", errs.len(), self.targets.len());
        }
        errs.into_result()
    }

    /// Encode metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();

        thread_local! {
            static BUFFER: std::cell::RefCell<Vec<u8>> = std::cell::RefCell::new(Vec::with_capacity(8192));
        }

        BUFFER.with(|buf| {
            let mut buffer = buf.borrow_mut();
            buffer.clear();

            encoder
                .encode(&metric_families, &mut *buffer)
                .map_err(|e| ExporterError::Metrics(e.to_string()))?;

            String::from_utf8(buffer.clone()).map_err(|e| ExporterError::Metrics(e.to_string()))
        })
    }
}

/// Run every collector against one device.
fn poll_target(target: &Target, collectors: &[EnabledCollector], scrape: &ScrapeMetrics) -> Result<()> {
    let ctx = CollectorContext::new(target.client.as_ref())
        .with_labels([target.name.as_str(), target.address.as_str()]);

    let mut errs = MultiError::new();
    for entry in collectors {
        let started = Instant::now();
        let result = entry.collector.collect(&ctx);
        let elapsed = started.elapsed();

        record_collector(scrape, target, &entry.key, elapsed, result.is_ok());
        match result {
            Ok(()) => debug!("Collector {} on {} took {:?}", entry.key, target.name, elapsed),
            Err(e) => {
                warn!("Collector {} failed on {}: {}", entry.key, target.name, e);
                errs.push(e.context(format!("collector {}", entry.key)));
            }
        }
    }

    let up = if errs.is_empty() { 1.0 } else { 0.0 };
    scrape
        .up
        .with_label_values(&[target.name.as_str(), target.address.as_str()])
        .set(up);

    errs.into_result()
}

fn record_collector(scrape: &ScrapeMetrics, target: &Target, key: &str, elapsed: Duration, ok: bool) {
    let labels = [target.name.as_str(), target.address.as_str(), key];
    scrape
        .collector_success
        .with_label_values(&labels)
        .set(if ok { 1.0 } else { 0.0 });
    scrape
        .collector_duration
        .with_label_values(&labels)
        .set(elapsed.as_secs_f64());
}
