//! Glimpse desktop responder — entry point.
//!
//! ```text
//! glimpse-desktop                  Mirror the primary screen
//! glimpse-desktop --image <path>   Mirror a still image file
//! glimpse-desktop --config <path>  Load a custom config TOML
//! glimpse-desktop --gen-config     Write default config to stdout
//! glimpse-desktop --no-tunnel      Skip the port-forward command
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use glimpse_core::event::{self, MirrorEvent};
use glimpse_core::pipeline::{ScreenSource, SourceProvider, StillSource};
use glimpse_core::region::CaptureRegion;
use glimpse_core::session::ResponderDriver;
use glimpse_core::state::StateReporter;
use glimpse_core::supervisor::{ConnectSupervisor, NoTunnel, Tunnel};
use glimpse_core::viewport::SharedViewport;

use glimpse_desktop::config::DesktopConfig;
use glimpse_desktop::tunnel::ForwardCommand;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "glimpse-desktop", about = "Mirror a region of the desktop to a device")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "glimpse-desktop.toml")]
    config: PathBuf,

    /// Mirror this image file instead of the screen.
    #[arg(short, long)]
    image: Option<PathBuf>,

    /// Connect to this address, overriding the config.
    #[arg(short, long)]
    addr: Option<SocketAddr>,

    /// Do not run the port-forward command.
    #[arg(long)]
    no_tunnel: bool,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.gen_config {
        let text = toml::to_string_pretty(&DesktopConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    let config = DesktopConfig::load(&cli.config);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("glimpse-desktop v{}", env!("CARGO_PKG_VERSION"));

    let source = build_source(&cli, &config)?;

    let viewport = SharedViewport::new();
    viewport.set_capture_region(CaptureRegion::new(
        config.source.origin_x,
        config.source.origin_y,
        0,
        0,
    ));

    let (tx, mut rx) = event::channel();
    let reporter = StateReporter::new(tx.clone());
    let driver = ResponderDriver::new(viewport, tx, reporter.clone(), source);

    let tunnel: Box<dyn Tunnel> = if cli.no_tunnel {
        Box::new(NoTunnel)
    } else {
        match ForwardCommand::from_config(&config.tunnel) {
            Some(forward) => Box::new(forward),
            None => Box::new(NoTunnel),
        }
    };

    let addr: SocketAddr = match cli.addr {
        Some(addr) => addr,
        None => format!("{}:{}", config.network.host, config.network.port).parse()?,
    };
    info!("responding on {addr}");

    let mut supervisor = ConnectSupervisor::new(addr, tunnel, driver, reporter)
        .with_backoff(Duration::from_secs(config.network.retry_interval_secs.max(1)));
    let stop = supervisor.stop_handle();

    // Ctrl-C handler.
    let stop_clone = stop.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Ctrl-C received — shutting down");
        stop_clone.store(true, std::sync::atomic::Ordering::SeqCst);
    });

    // Observer task: log state transitions and size notifications.
    tokio::spawn(async move {
        while let Some(ev) = rx.recv().await {
            match ev {
                MirrorEvent::StateChanged(state) => info!("connection {state}"),
                MirrorEvent::ViewportResized { width, height } => {
                    info!("device viewport is {width}x{height}")
                }
                MirrorEvent::FrameReady(_) => {}
            }
        }
    });

    supervisor.run().await;
    Ok(())
}

/// Pick the frame source from the CLI override and config.
fn build_source(
    cli: &Cli,
    config: &DesktopConfig,
) -> Result<Box<dyn SourceProvider>, Box<dyn std::error::Error>> {
    let image_path = cli.image.clone().or_else(|| {
        (config.source.kind == "image" && !config.source.image_path.is_empty())
            .then(|| PathBuf::from(&config.source.image_path))
    });

    if let Some(path) = image_path {
        info!("mirroring still image {}", path.display());
        let loaded = image::open(&path)?.to_rgba8();
        return Ok(Box::new(StillSource::with_image(loaded)));
    }

    match ScreenSource::open() {
        Ok(screen) => {
            info!("mirroring screen region {}", screen.bounds());
            Ok(Box::new(screen))
        }
        Err(e) => {
            warn!("screen capture unavailable ({e}); starting without a source");
            Ok(Box::new(StillSource::new()))
        }
    }
}
