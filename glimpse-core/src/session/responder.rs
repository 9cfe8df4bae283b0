//! Responder-side exchange loop: one session per physical connection.

use std::sync::atomic::{AtomicBool, Ordering};

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::Framed;
use tracing::{trace, warn};

use crate::codec::ResponderCodec;
use crate::error::GlimpseError;
use crate::event::{EventSender, MirrorEvent};
use crate::payload::ImagePayload;
use crate::pipeline::{FrameEncoder, SourceProvider};
use crate::request::ViewportRequest;
use crate::state::{ConnectionState, StateReporter};
use crate::viewport::SharedViewport;

/// Answers viewport requests with encoded frames, as fast as they
/// arrive — pacing belongs to the requester.
pub struct ResponderSession<'a, S> {
    framed: Framed<S, ResponderCodec>,
    viewport: SharedViewport,
    source: &'a mut dyn SourceProvider,
    encoder: FrameEncoder,
    events: EventSender,
    reporter: StateReporter,
    last_seen: Option<(u32, u32)>,
}

impl<'a, S: AsyncRead + AsyncWrite + Unpin> ResponderSession<'a, S> {
    pub fn new(
        stream: S,
        viewport: SharedViewport,
        source: &'a mut dyn SourceProvider,
        events: EventSender,
        reporter: StateReporter,
    ) -> Self {
        Self {
            framed: Framed::new(stream, ResponderCodec),
            viewport,
            source,
            encoder: FrameEncoder::new(),
            events,
            reporter,
            last_seen: None,
        }
    }

    /// Block on requests and reply until the transport fails or `stop`
    /// is raised. Capture and encode problems degrade to the empty
    /// sentinel; only I/O errors get out of this loop.
    ///
    /// The stop flag is checked between cycles, so teardown while the
    /// peer is idle waits for its next request (or its disconnect).
    pub async fn run(&mut self, stop: &AtomicBool) -> Result<(), GlimpseError> {
        loop {
            if stop.load(Ordering::SeqCst) {
                return Ok(());
            }
            let request = match self.framed.next().await {
                Some(Ok(request)) => request,
                Some(Err(e)) => return Err(e),
                None => return Err(GlimpseError::PeerClosed),
            };

            self.note_size(&request);
            self.reporter.report(ConnectionState::ConnectedActive);

            let payload = self.produce(&request);
            self.framed.send(payload).await?;
        }
    }

    /// Surface a size change to the observer before replying.
    fn note_size(&mut self, request: &ViewportRequest) {
        if self.last_seen != Some(request.size()) {
            trace!(width = request.width, height = request.height, "viewport size changed");
            let _ = self.events.send(MirrorEvent::ViewportResized {
                width: request.width,
                height: request.height,
            });
            self.viewport.set_negotiated_size(request.width, request.height);
            self.viewport.resize_region(request.width, request.height);
            self.last_seen = Some(request.size());
        }
        // Pan offsets are advisory here; region placement is driven by
        // set_capture_region on the shared state.
    }

    /// Run the pipeline for one request, degrading every pipeline
    /// failure to the "no image" sentinel.
    fn produce(&mut self, request: &ViewportRequest) -> ImagePayload {
        if request.is_degenerate() {
            return ImagePayload::empty();
        }

        let region = self.viewport.snapshot().region;
        let source_frame = match self.source.frame(region) {
            Ok(Some(frame)) => frame,
            Ok(None) => return ImagePayload::empty(),
            Err(e) => {
                warn!("source failed, sending empty payload: {e}");
                return ImagePayload::empty();
            }
        };

        match self.encoder.encode(&source_frame, request.width, request.height) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("encode failed, sending empty payload: {e}");
                ImagePayload::empty()
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
