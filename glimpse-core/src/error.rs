//! Domain-specific error types for the mirroring protocol.
//!
//! All fallible operations return `Result<T, GlimpseError>`.
//! Transport errors are fatal to the session that hits them and handled
//! by the supervisor's retry loop; pipeline errors degrade to the
//! empty-payload sentinel and never tear a connection down.

use thiserror::Error;

/// The canonical error type for the mirroring protocol.
#[derive(Debug, Error)]
pub enum GlimpseError {
    // ── Transport Errors ─────────────────────────────────────────
    /// The TCP/IO layer reported an error.
    #[error("connection error: {0}")]
    Connection(#[from] std::io::Error),

    /// The peer closed the connection between frames.
    #[error("peer closed the connection")]
    PeerClosed,

    /// The peer closed the connection mid-frame.
    #[error("short frame: expected {expected} bytes, got {actual}")]
    ShortFrame { expected: usize, actual: usize },

    /// A length prefix announced more bytes than the codec accepts.
    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    // ── Tunnel Errors ────────────────────────────────────────────
    /// The external port-forwarding hook failed.
    #[error("tunnel setup failed: {0}")]
    Tunnel(String),

    // ── Pipeline Errors ──────────────────────────────────────────
    /// Encoding or resampling an outgoing frame failed.
    #[error("image encode failed: {0}")]
    Encode(String),

    /// An incoming payload could not be decoded into a bitmap.
    #[error("image decode failed: {0}")]
    Decode(String),

    /// Screen capture failed or the capture backend is gone.
    #[error("screen capture failed: {0}")]
    Capture(String),

    // ── Plumbing Errors ──────────────────────────────────────────
    /// An mpsc channel was closed unexpectedly.
    #[error("channel closed")]
    ChannelClosed,

    /// Catch-all for errors that do not fit another variant.
    #[error("{0}")]
    Other(String),
}

impl GlimpseError {
    /// Whether this error is fatal to the session that raised it.
    ///
    /// Transport and tunnel failures terminate the session; pipeline
    /// failures are absorbed where they occur.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Connection(_)
                | Self::PeerClosed
                | Self::ShortFrame { .. }
                | Self::PayloadTooLarge { .. }
        )
    }
}

// ── Convenient From implementations ──────────────────────────────

impl From<String> for GlimpseError {
    fn from(s: String) -> Self {
        GlimpseError::Other(s)
    }
}

impl From<&str> for GlimpseError {
    fn from(s: &str) -> Self {
        GlimpseError::Other(s.to_string())
    }
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for GlimpseError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        GlimpseError::ChannelClosed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let e = GlimpseError::ShortFrame {
            expected: 16,
            actual: 7,
        };
        assert!(e.to_string().contains("16"));
        assert!(e.to_string().contains("7"));

        let e = GlimpseError::PayloadTooLarge {
            size: 1000,
            max: 500,
        };
        assert!(e.to_string().contains("1000"));
        assert!(e.to_string().contains("500"));
    }

    #[test]
    fn from_string() {
        let e: GlimpseError = "something broke".into();
        assert!(matches!(e, GlimpseError::Other(_)));
    }

    #[test]
    fn from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe broke");
        let e: GlimpseError = io_err.into();
        assert!(matches!(e, GlimpseError::Connection(_)));
        assert!(e.is_transport());
    }

    #[test]
    fn pipeline_errors_are_not_transport() {
        assert!(!GlimpseError::Decode("bad png".into()).is_transport());
        assert!(!GlimpseError::Capture("no display".into()).is_transport());
    }
}
