//! Configuration for the desktop responder.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DesktopConfig {
    /// Network settings.
    pub network: NetworkConfig,
    /// Tunnel (port forward) settings.
    pub tunnel: TunnelConfig,
    /// Frame source settings.
    pub source: SourceConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Network configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Host the forwarded port lives on.
    pub host: String,
    /// Local TCP port forwarded to the device.
    pub port: u16,
    /// Seconds between reconnection attempts.
    pub retry_interval_secs: u64,
}

/// Tunnel configuration.
///
/// The forward is established by running an external command; with an
/// empty program nothing is run and the port is assumed reachable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TunnelConfig {
    /// Program to run, e.g. "adb". Empty disables the tunnel.
    pub program: String,
    /// Arguments, e.g. ["forward", "tcp:7810", "tcp:7800"].
    pub args: Vec<String>,
}

/// Frame source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Source kind: "screen" or "image".
    pub kind: String,
    /// Image file to mirror when kind = "image".
    pub image_path: String,
    /// Capture region origin on the screen.
    pub origin_x: i32,
    pub origin_y: i32,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for DesktopConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            tunnel: TunnelConfig::default(),
            source: SourceConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 7810,
            retry_interval_secs: 1,
        }
    }
}

impl Default for TunnelConfig {
    fn default() -> Self {
        Self {
            program: "adb".into(),
            args: vec!["forward".into(), "tcp:7810".into(), "tcp:7800".into()],
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: "screen".into(),
            image_path: String::new(),
            origin_x: 0,
            origin_y: 0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".into() }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl DesktopConfig {
    /// Load configuration from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::info!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
