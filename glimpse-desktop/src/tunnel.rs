//! Port-forward tunnel backed by an external command.

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use glimpse_core::error::GlimpseError;
use glimpse_core::supervisor::Tunnel;

use crate::config::TunnelConfig;

/// Re-establishes the port forward by running a configured command,
/// typically `adb forward tcp:<local> tcp:<device>`.
///
/// The command is re-run after every failed connection attempt; a
/// forward that already exists is cheap to set up again.
pub struct ForwardCommand {
    program: String,
    args: Vec<String>,
}

impl ForwardCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Build the tunnel from config; `None` when no program is set.
    pub fn from_config(config: &TunnelConfig) -> Option<Self> {
        if config.program.is_empty() {
            return None;
        }
        Some(Self::new(config.program.clone(), config.args.clone()))
    }
}

#[async_trait]
impl Tunnel for ForwardCommand {
    async fn establish(&mut self) -> Result<(), GlimpseError> {
        debug!("running {} {}", self.program, self.args.join(" "));
        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .await
            .map_err(|e| GlimpseError::Tunnel(format!("{}: {e}", self.program)))?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("{} exited with {}", self.program, output.status);
            Err(GlimpseError::Tunnel(format!(
                "{} failed: {}",
                self.program,
                stderr.trim()
            )))
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
