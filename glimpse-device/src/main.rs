//! Glimpse device requester — entry point.
//!
//! Simulates the device side of the mirror: listens on the device
//! port, and once the desktop connects, polls it with viewport
//! requests and logs the frames that come back.
//!
//! ```text
//! glimpse-device                   Listen with the default viewport
//! glimpse-device --size 1080x1920  Request a different frame size
//! glimpse-device --config <path>   Load a custom config TOML
//! glimpse-device --gen-config      Write default config to stdout
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use glimpse_core::event::{self, MirrorEvent};
use glimpse_core::session::RequesterDriver;
use glimpse_core::state::StateReporter;
use glimpse_core::supervisor::AcceptSupervisor;
use glimpse_core::viewport::SharedViewport;

mod config;

use config::DeviceConfig;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "glimpse-device", about = "Device-side requester for the glimpse mirror")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "glimpse-device.toml")]
    config: PathBuf,

    /// Viewport size as WIDTHxHEIGHT, overriding the config.
    #[arg(short, long)]
    size: Option<String>,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,
}

/// Parse "WIDTHxHEIGHT".
fn parse_size(text: &str) -> Option<(u32, u32)> {
    let (w, h) = text.split_once('x')?;
    Some((w.trim().parse().ok()?, h.trim().parse().ok()?))
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.gen_config {
        let text = toml::to_string_pretty(&DeviceConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    let mut config = DeviceConfig::load(&cli.config);
    if let Some(spec) = &cli.size {
        match parse_size(spec) {
            Some((w, h)) => {
                config.viewport.width = w;
                config.viewport.height = h;
            }
            None => {
                eprintln!("invalid --size {spec:?}; expected WIDTHxHEIGHT");
                std::process::exit(1);
            }
        }
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("glimpse-device v{}", env!("CARGO_PKG_VERSION"));

    let viewport = SharedViewport::new();
    viewport.set_negotiated_size(config.viewport.width, config.viewport.height);

    let (tx, mut rx) = event::channel();
    let reporter = StateReporter::new(tx.clone());
    let driver = RequesterDriver::new(viewport, tx, reporter.clone())
        .with_interval(Duration::from_millis(config.viewport.interval_ms.max(1)));

    let listener = TcpListener::bind(("0.0.0.0", config.network.listen_port)).await?;
    info!("listening on {}", listener.local_addr()?);

    let mut supervisor = AcceptSupervisor::new(listener, driver, reporter);
    let stop = supervisor.stop_handle();

    // Ctrl-C handler.
    let stop_clone = stop.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Ctrl-C received — shutting down");
        stop_clone.store(true, std::sync::atomic::Ordering::SeqCst);
    });

    // Observer task: a display would paint here; we log instead.
    tokio::spawn(async move {
        let mut last: Option<(u32, u32)> = None;
        let mut frames: u64 = 0;
        while let Some(ev) = rx.recv().await {
            match ev {
                MirrorEvent::StateChanged(state) => info!("connection {state}"),
                MirrorEvent::FrameReady(Some(bitmap)) => {
                    frames += 1;
                    let dims = bitmap.dimensions();
                    if last != Some(dims) {
                        info!("receiving {}x{} frames", dims.0, dims.1);
                        last = Some(dims);
                    }
                    if frames % 100 == 0 {
                        info!("{frames} frames received");
                    }
                }
                MirrorEvent::FrameReady(None) => {
                    if last.take().is_some() {
                        warn!("no signal from the desktop");
                    }
                }
                MirrorEvent::ViewportResized { .. } => {}
            }
        }
    });

    supervisor.run().await;
    Ok(())
}
