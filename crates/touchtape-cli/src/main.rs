//! touchtape entry point.

mod args;
mod device;
mod driver;

use anyhow::{Context, Result};
use clap::Parser;
use touchtape_core::clock::Clock;
use touchtape_core::panel::TouchPanel;
use touchtape_core::queue::ReplayQueue;
use tracing::{error, info};

use crate::args::Cli;
use crate::device::TouchScreen;

/// Simultaneous contacts tracked per device.
const SLOT_COUNT: usize = 4;

fn main() {
    let cli = Cli::parse();

    // stdout carries the recording; all diagnostics go to stderr.
    let default_level = if cli.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        error!("{e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let path = match cli.device.clone() {
        Some(path) => path,
        None => {
            device::detect_touch_device().context("no multi-touch device found under /dev/input")?
        }
    };
    info!("using multitouch device {}", path.display());

    if cli.scale_nhd {
        info!("scaling all touches to nHD resolution");
    }
    let (width, height) = cli.screen_size();

    let screen = TouchScreen::open(&path)?;
    screen.log_identity();
    let device_stream = screen
        .try_clone_stream()
        .context("could not clone device event stream")?;

    let clock = Clock::new();
    let mut panel = TouchPanel::new(screen, SLOT_COUNT, width, height, clock);
    panel.configure();

    let queue = ReplayQueue::new(std::io::stdout());

    // Everything runs on one thread; the only suspension point is the
    // driver's multiplexed wait.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;
    runtime.block_on(driver::run(panel, queue, clock, device_stream))
}
