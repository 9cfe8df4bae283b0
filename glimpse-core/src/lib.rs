//! # glimpse-core
//!
//! Core library for the GLIMPSE screen-mirroring protocol: a desktop
//! (responder) answers a device's (requester) viewport requests with
//! scaled, PNG-encoded frames over one persistent TCP connection
//! through a forwarded port.
//!
//! This crate contains:
//! - **Wire types**: `ViewportRequest`, `ImagePayload`, `CaptureRegion`
//! - **Codec**: `RequesterCodec` / `ResponderCodec` for framed TCP I/O
//!   via `tokio_util`
//! - **Pipeline**: `FrameEncoder`, `FrameDecoder`, and the
//!   `SourceProvider` seam (`StillSource`, `ScreenSource`)
//! - **Session**: `RequesterSession` / `ResponderSession` — one
//!   request/response exchange loop per physical connection
//! - **Supervisor**: `ConnectSupervisor` / `AcceptSupervisor` — the
//!   fixed-backoff retry loops owning `ConnectionState`
//! - **State**: `SharedViewport`, `ConnectionState`, `StateReporter`,
//!   and the `MirrorEvent` observer channel
//! - **Error**: `GlimpseError` — typed, `thiserror`-based hierarchy

pub mod codec;
pub mod error;
pub mod event;
pub mod payload;
pub mod pipeline;
pub mod region;
pub mod request;
pub mod session;
pub mod state;
pub mod supervisor;
pub mod viewport;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use codec::{RequesterCodec, ResponderCodec};
pub use error::GlimpseError;
pub use event::{EventReceiver, EventSender, MirrorEvent};
pub use payload::{ImagePayload, MAX_PAYLOAD_SIZE};
pub use pipeline::{FrameDecoder, FrameEncoder, ScreenSource, SourceProvider, StillSource};
pub use region::CaptureRegion;
pub use request::ViewportRequest;
pub use session::{
    DEFAULT_CYCLE_INTERVAL, RequesterDriver, RequesterSession, ResponderDriver, ResponderSession,
    SessionDriver,
};
pub use state::{ConnectionState, StateReporter};
pub use supervisor::{AcceptSupervisor, ConnectSupervisor, DEFAULT_BACKOFF, NoTunnel, Tunnel};
pub use viewport::{SharedViewport, ViewportSnapshot};
