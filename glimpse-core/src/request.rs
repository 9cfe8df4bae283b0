//! The fixed 16-byte viewport request sent by the requester every cycle.
//!
//! ## Wire format (big-endian)
//!
//! ```text
//! pan_x:   u32  (4)
//! pan_y:   u32  (4)
//! width:   u32  (4)
//! height:  u32  (4)
//! ```
//!
//! There is no magic number and no versioning; the format is fixed.

use crate::error::GlimpseError;

/// "Here is my current pan position and pixel size; send me an image
/// to fill it."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportRequest {
    /// Horizontal pan offset, clamped non-negative by the producer.
    pub pan_x: u32,
    /// Vertical pan offset, clamped non-negative by the producer.
    pub pan_y: u32,
    /// Requested image width in pixels.
    pub width: u32,
    /// Requested image height in pixels.
    pub height: u32,
}

impl ViewportRequest {
    /// Encoded size on the wire.
    pub const SIZE: usize = 16;

    /// Serialize to bytes (big-endian).
    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0..4].copy_from_slice(&self.pan_x.to_be_bytes());
        buf[4..8].copy_from_slice(&self.pan_y.to_be_bytes());
        buf[8..12].copy_from_slice(&self.width.to_be_bytes());
        buf[12..16].copy_from_slice(&self.height.to_be_bytes());
        buf
    }

    /// Deserialize from bytes.
    pub fn decode(data: &[u8]) -> Result<Self, GlimpseError> {
        if data.len() < Self::SIZE {
            return Err(GlimpseError::ShortFrame {
                expected: Self::SIZE,
                actual: data.len(),
            });
        }
        Ok(Self {
            pan_x: u32::from_be_bytes(data[0..4].try_into().unwrap()),
            pan_y: u32::from_be_bytes(data[4..8].try_into().unwrap()),
            width: u32::from_be_bytes(data[8..12].try_into().unwrap()),
            height: u32::from_be_bytes(data[12..16].try_into().unwrap()),
        })
    }

    /// The requested viewport as a `(width, height)` pair.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Whether the requested viewport is too small to render into.
    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

// ── Tests ────────────────────────────────────────────────────────
