//! Connection supervisors: the outer retry loops owning the observable
//! [`ConnectionState`].
//!
//! Two acquisition modes cover both ends of the tunnel:
//!
//! - [`ConnectSupervisor`] dials the forwarded port, invoking the
//!   [`Tunnel`] collaborator after every failed attempt.
//! - [`AcceptSupervisor`] owns one listening socket, accepts a single
//!   connection at a time, and loops back to accept without rebinding.
//!
//! Both retry on a constant interval (1 second by default — this is a
//! fixed backoff, not exponential), run unboundedly until stopped, and
//! hand every obtained connection to a fresh session via
//! [`SessionDriver`]. Cancellation is cooperative and coarse: the stop
//! flag is checked once per outer iteration, never mid-cycle.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use crate::error::GlimpseError;
use crate::session::SessionDriver;
use crate::state::{ConnectionState, StateReporter};

/// Fixed interval between connection attempts.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);

// ── Tunnel ───────────────────────────────────────────────────────

/// External collaborator that (re)establishes the network path between
/// the endpoints, e.g. by forwarding a local port to the device.
///
/// Invoked after every failed connection attempt; its own failure
/// leaves the supervisor `Disconnected` until the next retry.
#[async_trait]
pub trait Tunnel: Send {
    async fn establish(&mut self) -> Result<(), GlimpseError>;
}

/// No-op tunnel for setups where the path already exists.
pub struct NoTunnel;

#[async_trait]
impl Tunnel for NoTunnel {
    async fn establish(&mut self) -> Result<(), GlimpseError> {
        Ok(())
    }
}

// ── ConnectSupervisor ────────────────────────────────────────────

/// Dial-side retry loop.
pub struct ConnectSupervisor<D: SessionDriver> {
    addr: SocketAddr,
    tunnel: Box<dyn Tunnel>,
    driver: D,
    reporter: StateReporter,
    stop: Arc<AtomicBool>,
    backoff: Duration,
}

impl<D: SessionDriver> ConnectSupervisor<D> {
    pub fn new(
        addr: SocketAddr,
        tunnel: Box<dyn Tunnel>,
        driver: D,
        reporter: StateReporter,
    ) -> Self {
        Self {
            addr,
            tunnel,
            driver,
            reporter,
            stop: Arc::new(AtomicBool::new(false)),
            backoff: DEFAULT_BACKOFF,
        }
    }

    /// Override the retry interval (tests use a tighter one).
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// A cloneable handle that stops the loop from another task.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Run until the stop flag is raised.
    pub async fn run(&mut self) {
        while !self.stop.load(Ordering::SeqCst) {
            match TcpStream::connect(self.addr).await {
                Ok(stream) => {
                    let _ = stream.set_nodelay(true);
                    info!(peer = %self.addr, "connection established");
                    self.reporter.report(ConnectionState::ConnectedIdle);

                    if let Err(e) = self.driver.drive(stream, Arc::clone(&self.stop)).await {
                        debug!("session ended: {e}");
                    }
                    // The exchange loop is over; whatever happens next
                    // is a fresh attempt.
                    self.reporter.report(ConnectionState::ConnectedIdle);
                }
                Err(e) => {
                    debug!(peer = %self.addr, "connect failed: {e}");
                    self.reporter.report(ConnectionState::Disconnected);
                    if let Err(te) = self.tunnel.establish().await {
                        warn!("tunnel re-establish failed: {te}");
                    }
                }
            }

            tokio::time::sleep(self.backoff).await;
        }
        info!("connect supervisor stopped");
    }
}

// ── AcceptSupervisor ─────────────────────────────────────────────

/// Listen-side retry loop: one connection at a time over one socket.
pub struct AcceptSupervisor<D: SessionDriver> {
    listener: TcpListener,
    driver: D,
    reporter: StateReporter,
    stop: Arc<AtomicBool>,
    backoff: Duration,
}

impl<D: SessionDriver> AcceptSupervisor<D> {
    /// Wrap an already-bound listener; the socket is never rebound and
    /// closes when the supervisor is dropped after [`run`](Self::run)
    /// returns.
    pub fn new(listener: TcpListener, driver: D, reporter: StateReporter) -> Self {
        Self {
            listener,
            driver,
            reporter,
            stop: Arc::new(AtomicBool::new(false)),
            backoff: DEFAULT_BACKOFF,
        }
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// The address the underlying socket is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, GlimpseError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept-and-serve until the stop flag is raised.
    pub async fn run(&mut self) {
        while !self.stop.load(Ordering::SeqCst) {
            let accepted = tokio::select! {
                result = self.listener.accept() => result,
                _ = wait_for_stop(&self.stop) => break,
            };

            match accepted {
                Ok((stream, peer)) => {
                    let _ = stream.set_nodelay(true);
                    info!(%peer, "connection accepted");
                    self.reporter.report(ConnectionState::ConnectedIdle);

                    if let Err(e) = self.driver.drive(stream, Arc::clone(&self.stop)).await {
                        debug!("session ended: {e}");
                    }
                    self.reporter.report(ConnectionState::ConnectedIdle);
                }
                Err(e) => {
                    warn!("accept error: {e}");
                    self.reporter.report(ConnectionState::Disconnected);
                }
            }

            tokio::time::sleep(self.backoff).await;
        }
        info!("accept supervisor stopped");
    }
}

/// Resolves once `stop` becomes true. Accepting is the one place a
/// blocked supervisor could otherwise hang forever with no peer.
async fn wait_for_stop(stop: &Arc<AtomicBool>) {
    loop {
        if stop.load(Ordering::SeqCst) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

// ── Tests ────────────────────────────────────────────────────────
