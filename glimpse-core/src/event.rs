//! Events delivered from the worker context to the observer.
//!
//! The session and supervisor run on the tokio worker; the UI (or any
//! other consumer) must never be poked directly from there. Everything
//! observable crosses this unbounded mpsc channel, so sending never
//! blocks a cycle.

use image::RgbaImage;
use tokio::sync::mpsc;

use crate::state::ConnectionState;

/// Everything the core reports outward.
#[derive(Debug)]
pub enum MirrorEvent {
    /// The supervisor-owned connection state changed.
    StateChanged(ConnectionState),

    /// The requester asked for a size different from the last cycle.
    /// Emitted by the responder before the reply is sent.
    ViewportResized { width: u32, height: u32 },

    /// One cycle completed on the requester. `None` means the peer had
    /// no image to show ("no signal"), which is distinct from transport
    /// disconnection.
    FrameReady(Option<RgbaImage>),
}

pub type EventSender = mpsc::UnboundedSender<MirrorEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<MirrorEvent>;

/// Create the observer channel.
pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
