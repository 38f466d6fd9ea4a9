//! Table of available feature collectors.
//!
//! The binary builds one [`CollectorRegistry`] at startup through
//! [`crate::collectors::register_all`] and only reads it afterwards; the
//! exporter looks up the configured keys and instantiates each collector
//! from its factory.

use crate::context::CollectorContext;
use crate::error::{ExporterError, Result};
use tracing::debug;

/// A feature module that turns device queries into metrics.
pub trait Collector: Send + Sync {
    /// Register every series family this collector emits.
    fn describe(&self, registry: &prometheus::Registry) -> Result<()>;

    /// Query the device through `ctx.client` and emit metrics under labels
    /// derived from `ctx`. Failures of independent sub-items are aggregated
    /// rather than aborting the pass.
    fn collect(&self, ctx: &CollectorContext<'_>) -> Result<()>;

    /// Drop all series recorded by previous passes.
    fn reset(&self);
}

/// Produces a fresh collector instance.
pub type CollectorFactory = fn() -> Result<Box<dyn Collector>>;

/// One registered collector.
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub key: String,
    pub description: String,
    pub factory: CollectorFactory,
}

/// Collectors known to the process, in registration order.
#[derive(Debug, Default)]
pub struct CollectorRegistry {
    entries: Vec<RegistryEntry>,
}

impl CollectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a collector under `key`. Registering a key twice is an error.
    pub fn register(&mut self, key: &str, factory: CollectorFactory, description: &str) -> Result<()> {
        if self.entry(key).is_some() {
            return Err(ExporterError::DuplicateRegistration(key.to_string()));
        }

        debug!("Registered collector {}", key);
        self.entries.push(RegistryEntry {
            key: key.to_string(),
            description: description.to_string(),
            factory,
        });
        Ok(())
    }

    pub fn entry(&self, key: &str) -> Option<&RegistryEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    pub fn lookup(&self, key: &str) -> Option<CollectorFactory> {
        self.entry(key).map(|e| e.factory)
    }

    /// Every entry, in registration order.
    pub fn list(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
