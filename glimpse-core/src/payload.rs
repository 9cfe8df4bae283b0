//! The length-prefixed image payload sent by the responder every cycle.
//!
//! ## Wire format (big-endian)
//!
//! ```text
//! length: u32  (4)
//! data:   [u8] (exactly `length` bytes of encoded still image)
//! ```
//!
//! `length == 0` is a valid sentinel meaning "no image available" —
//! the responder has nothing to show. It decodes to an explicit empty
//! payload, never a decode failure.

use bytes::Bytes;

/// Upper bound for a single encoded frame. A PNG of a large desktop
/// region stays well under this; anything bigger is a corrupt or
/// hostile length prefix.
pub const MAX_PAYLOAD_SIZE: usize = 64 * 1024 * 1024;

/// One encoded still image, or the "no image" sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    data: Bytes,
}

impl ImagePayload {
    /// Size of the length prefix on the wire.
    pub const LEN_PREFIX: usize = 4;

    /// Wrap encoded image bytes.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }

    /// The "no image available" sentinel.
    pub fn empty() -> Self {
        Self { data: Bytes::new() }
    }

    /// Whether this payload is the empty sentinel.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Encoded image bytes (empty for the sentinel).
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Payload length in bytes, excluding the length prefix.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Total size on the wire including the length prefix.
    pub fn wire_len(&self) -> usize {
        Self::LEN_PREFIX + self.data.len()
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sentinel() {
        let p = ImagePayload::empty();
        assert!(p.is_empty());
        assert_eq!(p.len(), 0);
        assert_eq!(p.wire_len(), 4);
    }

    #[test]
    fn non_empty_payload() {
        let p = ImagePayload::new(vec![1u8, 2, 3]);
        assert!(!p.is_empty());
        assert_eq!(p.len(), 3);
        assert_eq!(p.wire_len(), 7);
        assert_eq!(p.bytes(), &[1, 2, 3]);
    }
}
