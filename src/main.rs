use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use hapkit::config::{DeviceKind, RuntimeConfig};
use hapkit::sim::SimulatedHapkit;
use hapkit::{Controller, Hapkit, HapticDevice, TracingSink};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hapkit")]
#[command(about = "Joystick-driven force feedback for a Hapkit", long_about = None)]
struct Args {
    /// Runtime configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Device to drive: sim, hid, bluetooth or auto
    #[arg(short, long)]
    device: Option<DeviceKind>,

    /// Stop after this many iterations instead of running forever
    #[arg(short = 'n', long)]
    iterations: Option<u64>,

    /// Loop period in milliseconds, at least 10
    #[arg(long)]
    period_ms: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

async fn drive<D: HapticDevice>(
    device: D,
    config: &RuntimeConfig,
    iterations: Option<u64>,
) -> anyhow::Result<()> {
    let mut controller = Controller::new(device, TracingSink).with_period(config.loop_period());
    controller.setup().await.context("Hapkit setup failed")?;

    match iterations {
        Some(n) => {
            if let Some(last) = controller.run_for(n).await? {
                info!(command = last.command.value(), "Finished after {} iterations", n);
            }
            Ok(())
        }
        None => match controller.run().await? {},
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = if args.verbose { "hapkit=debug,info" } else { "hapkit=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    let mut config = match &args.config {
        Some(path) => RuntimeConfig::load(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => RuntimeConfig::default(),
    };
    if let Some(device) = args.device {
        config.device = device;
    }
    if let Some(period_ms) = args.period_ms {
        config.loop_period_ms = period_ms;
    }
    config.validate()?;

    info!(device = %config.device, period_ms = config.loop_period_ms, "Starting Hapkit controller");

    match config.device {
        DeviceKind::Simulated => {
            let device = SimulatedHapkit::new(config.sim.clone(), config.loop_period());
            drive(device, &config, args.iterations).await
        }
        DeviceKind::Hid | DeviceKind::Bluetooth | DeviceKind::Auto => {
            let device = Hapkit::connect(&config)
                .await
                .context("Failed to connect to the Hapkit")?;
            drive(device, &config, args.iterations).await
        }
    }
}
