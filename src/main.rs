use anyhow::Result;
use clap::Parser;
use mikrotik_exporter::{collectors, config::Settings, exporter::Exporter, server::start_server};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// MikroTik Exporter - Prometheus metrics exporter for RouterOS devices
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", env = "MIKROTIK_EXPORTER_CONFIG")]
    config: Option<String>,

    /// Print the available collectors and exit
    #[arg(long)]
    list_collectors: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.list_collectors {
        for entry in collectors::default_registry()?.list() {
            println!("{:<12} {}", entry.key, entry.description);
        }
        return Ok(());
    }

    let settings = Settings::load(args.config.as_deref())?;

    init_logging(&settings.exporter.log_level)?;

    // Duplicate keys abort startup here
    let registry = collectors::default_registry()?;

    info!("Starting MikroTik Exporter");
    info!("Devices: {}", settings.devices.len());
    info!("Listen address: {}", settings.exporter.listen_address);

    // REST clients are blocking and must be created outside the runtime
    let exporter = Arc::new(Exporter::from_settings(&settings, &registry)?);
    info!("Exporter initialized");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let served = runtime.block_on(start_server(
        &settings.exporter.listen_address,
        Arc::clone(&exporter),
    ));
    if let Err(e) = served {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}

/// Initialize structured logging with tracing.
fn init_logging(log_level: &str) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    Ok(())
}
