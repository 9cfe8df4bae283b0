//! Configuration for the device requester.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Network settings.
    pub network: NetworkConfig,
    /// Viewport settings.
    pub viewport: ViewportConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Network configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// TCP port to listen on for the desktop connection.
    pub listen_port: u16,
}

/// Viewport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Requested frame width in pixels.
    pub width: u32,
    /// Requested frame height in pixels.
    pub height: u32,
    /// Milliseconds between request/response cycles.
    pub interval_ms: u64,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            viewport: ViewportConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self { listen_port: 7800 }
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 480,
            height: 800,
            interval_ms: 50,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".into() }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl DeviceConfig {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_config() {
        let cfg = DeviceConfig::default();
        let text = toml::to_string_pretty(&cfg).unwrap();
        let parsed: DeviceConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.network.listen_port, 7800);
        assert_eq!((parsed.viewport.width, parsed.viewport.height), (480, 800));
        assert_eq!(parsed.viewport.interval_ms, 50);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let parsed: DeviceConfig =
            toml::from_str("[viewport]\nwidth = 1080\nheight = 1920\n").unwrap();
        assert_eq!((parsed.viewport.width, parsed.viewport.height), (1080, 1920));
        assert_eq!(parsed.network.listen_port, 7800);
    }
}
