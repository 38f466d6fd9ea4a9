//! # MikroTik Exporter
//!
//! A Prometheus metrics exporter for MikroTik RouterOS devices.
//!
//! ## Overview
//!
//! Feature collectors declare which RouterOS properties they read and how
//! each property maps to a metric; the framework in this crate runs the
//! queries, converts the string values, attaches labels and tolerates
//! per-item failures without aborting a scrape.
//!
//! - [`metrics::PropertyMetric`] - one property mapped to one series family
//! - [`metrics::PropertyMetricList`] - descriptors sharing a label schema
//! - [`context::CollectorContext`] - query client plus accumulated labels
//! - [`registry::CollectorRegistry`] - available collectors by key
//! - [`error::MultiError`] - aggregation of independent failures
//!
//! ## Quick Start
//!
//! ```no_run
//! use mikrotik_exporter::{collectors, config::Settings, exporter::Exporter, server::start_server};
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::load(Some("config/default.toml"))?;
//!     let registry = collectors::default_registry()?;
//!
//!     // REST clients are blocking, build them before entering the runtime
//!     let exporter = Arc::new(Exporter::from_settings(&settings, &registry)?);
//!
//!     let runtime = tokio::runtime::Runtime::new()?;
//!     runtime.block_on(start_server(&settings.exporter.listen_address, exporter))?;
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! The exporter can be configured via:
//! - TOML configuration file
//! - Environment variables (with `MIKROTIK_EXPORTER_` prefix)
//! - Command-line arguments
//!
//! See [`config::Settings`] for details.

pub mod client;
pub mod collectors;
pub mod config;
pub mod context;
pub mod convert;
pub mod error;
pub mod exporter;
pub mod metrics;
pub mod registry;
pub mod server;

pub use error::{ExporterError, MultiError, Result};
