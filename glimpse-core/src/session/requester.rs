//! Requester-side exchange loop: one session per physical connection.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::MissedTickBehavior;
use tokio_util::codec::Framed;
use tracing::trace;

use crate::codec::RequesterCodec;
use crate::error::GlimpseError;
use crate::event::{EventSender, MirrorEvent};
use crate::pipeline::FrameDecoder;
use crate::request::ViewportRequest;
use crate::state::{ConnectionState, StateReporter};
use crate::viewport::SharedViewport;

/// Default pacing between request/response cycles.
pub const DEFAULT_CYCLE_INTERVAL: Duration = Duration::from_millis(50);

/// Drives paced request/response cycles over one connection.
///
/// Discarded once [`run`](Self::run) returns; a new connection gets a
/// new session.
pub struct RequesterSession<S> {
    framed: Framed<S, RequesterCodec>,
    viewport: SharedViewport,
    decoder: FrameDecoder,
    events: EventSender,
    reporter: StateReporter,
    interval: Duration,
}

impl<S: AsyncRead + AsyncWrite + Unpin> RequesterSession<S> {
    pub fn new(
        stream: S,
        viewport: SharedViewport,
        events: EventSender,
        reporter: StateReporter,
        interval: Duration,
    ) -> Self {
        Self {
            framed: Framed::new(stream, RequesterCodec),
            viewport,
            decoder: FrameDecoder::new(),
            events,
            reporter,
            interval,
        }
    }

    /// Run cycles until an I/O step fails or `stop` is raised.
    ///
    /// Any transport error is fatal to this session; retry belongs to
    /// the supervisor. The stop flag is only checked between cycles, so
    /// cancellation latency is bounded by one cycle.
    pub async fn run(&mut self, stop: &AtomicBool) -> Result<(), GlimpseError> {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if stop.load(Ordering::SeqCst) {
                return Ok(());
            }
            ticker.tick().await;
            self.cycle().await?;
            self.reporter.report(ConnectionState::ConnectedActive);
        }
    }

    /// One cycle: snapshot state, write a request, read the reply
    /// fully, deliver the frame.
    async fn cycle(&mut self) -> Result<(), GlimpseError> {
        // Consistent snapshot under the viewport lock; the request it
        // produced may then be exchanged outside of it.
        let snap = self.viewport.snapshot();
        let request = ViewportRequest {
            pan_x: snap.pan_x,
            pan_y: snap.pan_y,
            width: snap.width,
            height: snap.height,
        };

        self.framed.send(request).await?;

        let payload = match self.framed.next().await {
            Some(Ok(payload)) => payload,
            Some(Err(e)) => return Err(e),
            None => return Err(GlimpseError::PeerClosed),
        };

        trace!(len = payload.len(), "payload received");
        let bitmap = self.decoder.decode(&payload);
        let _ = self.events.send(MirrorEvent::FrameReady(bitmap));
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ResponderCodec;
    use crate::event;
    use crate::payload::ImagePayload;
    use crate::pipeline::FrameEncoder;
    use std::sync::Arc;

    fn session_over_duplex(
        interval: Duration,
    ) -> (
        RequesterSession<tokio::io::DuplexStream>,
        Framed<tokio::io::DuplexStream, ResponderCodec>,
        event::EventReceiver,
        SharedViewport,
    ) {
        let (near, far) = tokio::io::duplex(1 << 20);
        let (tx, rx) = event::channel();
        let viewport = SharedViewport::new();
        let session = RequesterSession::new(
            near,
            viewport.clone(),
            tx.clone(),
            StateReporter::new(tx),
            interval,
        );
        (session, Framed::new(far, ResponderCodec), rx, viewport)
    }

    #[tokio::test]
    async fn cycle_sends_snapshot_and_delivers_frame() {
        let (mut session, mut peer, mut rx, viewport) =
            session_over_duplex(Duration::from_millis(1));
        viewport.set_pan_offset(3, 4);
        viewport.set_negotiated_size(20, 10);

        let stop = Arc::new(AtomicBool::new(false));
        let driver = tokio::spawn(async move {
            let _ = session.run(&stop).await;
        });

        let request = peer.next().await.unwrap().unwrap();
        assert_eq!((request.pan_x, request.pan_y), (3, 4));
        assert_eq!(request.size(), (20, 10));

        let payload = FrameEncoder::new()
            .encode(&image::RgbaImage::new(20, 10), 20, 10)
            .unwrap();
        peer.send(payload).await.unwrap();

        loop {
            match rx.recv().await.unwrap() {
                MirrorEvent::FrameReady(Some(bitmap)) => {
                    assert_eq!(bitmap.dimensions(), (20, 10));
                    break;
                }
                MirrorEvent::FrameReady(None) => panic!("expected a decoded frame"),
                _ => {}
            }
        }
        driver.abort();
    }

    #[tokio::test]
    async fn empty_payload_delivers_no_signal() {
        let (mut session, mut peer, mut rx, _viewport) =
            session_over_duplex(Duration::from_millis(1));

        let stop = Arc::new(AtomicBool::new(false));
        let driver = tokio::spawn(async move {
            let _ = session.run(&stop).await;
        });

        let _ = peer.next().await.unwrap().unwrap();
        peer.send(ImagePayload::empty()).await.unwrap();

        loop {
            if let MirrorEvent::FrameReady(bitmap) = rx.recv().await.unwrap() {
                assert!(bitmap.is_none());
                break;
            }
        }
        driver.abort();
    }

    #[tokio::test]
    async fn peer_close_terminates_session() {
        let (mut session, peer, _rx, _viewport) = session_over_duplex(Duration::from_millis(1));
        drop(peer);

        let stop = AtomicBool::new(false);
        let err = session.run(&stop).await.unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn stop_flag_ends_session_cleanly() {
        let (mut session, _peer, _rx, _viewport) = session_over_duplex(Duration::from_millis(1));
        let stop = AtomicBool::new(true);
        assert!(session.run(&stop).await.is_ok());
    }
}
