//! Request/response sessions and the driver seam the supervisor uses
//! to start a fresh one per connection.

pub mod requester;
pub mod responder;

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;

use crate::error::GlimpseError;
use crate::event::EventSender;
use crate::pipeline::SourceProvider;
use crate::state::StateReporter;
use crate::viewport::SharedViewport;

pub use requester::{DEFAULT_CYCLE_INTERVAL, RequesterSession};
pub use responder::ResponderSession;

// ── SessionDriver ────────────────────────────────────────────────

/// Builds and runs one session for one obtained connection.
///
/// Implementations keep the long-lived collaborators (viewport, source,
/// event channel); each `drive` call gets a fresh session, which is
/// discarded when the call returns.
#[async_trait]
pub trait SessionDriver: Send {
    async fn drive(&mut self, stream: TcpStream, stop: Arc<AtomicBool>)
    -> Result<(), GlimpseError>;
}

// ── RequesterDriver ──────────────────────────────────────────────

/// Spawns paced requester sessions.
pub struct RequesterDriver {
    viewport: SharedViewport,
    events: EventSender,
    reporter: StateReporter,
    interval: Duration,
}

impl RequesterDriver {
    pub fn new(viewport: SharedViewport, events: EventSender, reporter: StateReporter) -> Self {
        Self {
            viewport,
            events,
            reporter,
            interval: DEFAULT_CYCLE_INTERVAL,
        }
    }

    /// Override the cycle pacing (tests use a tighter interval).
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

#[async_trait]
impl SessionDriver for RequesterDriver {
    async fn drive(
        &mut self,
        stream: TcpStream,
        stop: Arc<AtomicBool>,
    ) -> Result<(), GlimpseError> {
        let mut session = RequesterSession::new(
            stream,
            self.viewport.clone(),
            self.events.clone(),
            self.reporter.clone(),
            self.interval,
        );
        session.run(&stop).await
    }
}

// ── ResponderDriver ──────────────────────────────────────────────

/// Spawns responder sessions over a runtime-selected source.
pub struct ResponderDriver {
    viewport: SharedViewport,
    events: EventSender,
    reporter: StateReporter,
    source: Box<dyn SourceProvider>,
}

impl ResponderDriver {
    pub fn new(
        viewport: SharedViewport,
        events: EventSender,
        reporter: StateReporter,
        source: Box<dyn SourceProvider>,
    ) -> Self {
        Self {
            viewport,
            events,
            reporter,
            source,
        }
    }
}

#[async_trait]
impl SessionDriver for ResponderDriver {
    async fn drive(
        &mut self,
        stream: TcpStream,
        stop: Arc<AtomicBool>,
    ) -> Result<(), GlimpseError> {
        let mut session = ResponderSession::new(
            stream,
            self.viewport.clone(),
            self.source.as_mut(),
            self.events.clone(),
            self.reporter.clone(),
        );
        session.run(&stop).await
    }
}
