//! Feature collectors.
//!
//! Each module covers one RouterOS feature area: it declares its
//! [`PropertyMetricList`](crate::metrics::PropertyMetricList), issues the
//! queries it needs and exposes a `register` function adding itself to a
//! [`CollectorRegistry`].

pub mod interface;
pub mod lte;
pub mod resource;

use crate::error::Result;
use crate::registry::CollectorRegistry;

pub use interface::InterfaceCollector;
pub use lte::LteCollector;
pub use resource::ResourceCollector;

/// Register every built-in collector, in a fixed order.
pub fn register_all(registry: &mut CollectorRegistry) -> Result<()> {
    resource::register(registry)?;
    interface::register(registry)?;
    lte::register(registry)?;
    Ok(())
}

/// Registry populated with every built-in collector.
pub fn default_registry() -> Result<CollectorRegistry> {
    let mut registry = CollectorRegistry::new();
    register_all(&mut registry)?;
    Ok(registry)
}
