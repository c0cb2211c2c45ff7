//! Balancer service entry point

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sdnlb_balancer::{control_loop, ApiServer, Engine, LoggingActuator};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address
    #[arg(long)]
    bind_address: Option<String>,

    /// Port
    #[arg(short, long)]
    port: Option<u16>,

    /// Initial topology name
    #[arg(short, long)]
    topology: Option<String>,

    /// Control-loop speed multiplier (polling interval = 1/speed)
    #[arg(long)]
    speed: Option<f64>,

    /// Disable automatic migration (decisions still available via trigger)
    #[arg(long)]
    no_auto_migration: bool,

    /// Disable the embedded traffic simulator (live telemetry only)
    #[arg(long)]
    no_simulator: bool,

    /// Traffic pattern for the simulator
    #[arg(long)]
    pattern: Option<String>,

    /// Seed for the simulator's jitter
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sdnlb_balancer=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Starting SDNLB balancer");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Load configuration (file + SDNLB_ env overrides), then CLI overrides
    let mut config = config::load_config(args.config.as_deref())?;
    if let Some(bind_address) = args.bind_address {
        config.bind_address = bind_address;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(topology) = args.topology {
        config.topology = topology;
    }
    if let Some(speed) = args.speed {
        config.speed = speed;
    }
    if args.no_auto_migration {
        config.auto_migration = false;
    }
    if args.no_simulator {
        config.simulator.enabled = false;
    }
    if let Some(pattern) = args.pattern {
        config.simulator.pattern = pattern;
    }
    if let Some(seed) = args.seed {
        config.simulator.seed = seed;
    }
    config.validate()?;

    info!("Configuration loaded: {:?}", config);

    let engine = Arc::new(Engine::new(&config, Arc::new(LoggingActuator)));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let loop_handle = tokio::spawn(control_loop::run(engine.clone(), shutdown_rx));

    let server = ApiServer::new(config, engine);

    tokio::select! {
        result = server.start() => {
            if let Err(e) = result {
                error!("API server error: {}", e);
                let _ = shutdown_tx.send(true);
                let _ = loop_handle.await;
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    let _ = shutdown_tx.send(true);
    let _ = loop_handle.await;
    info!("Balancer stopped");
    Ok(())
}
