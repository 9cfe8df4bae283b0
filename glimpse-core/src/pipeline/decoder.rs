//! Requester-side payload decoder.
//!
//! A malformed payload is treated exactly like the empty sentinel: the
//! viewer shows "no signal" and the connection stays up.

use image::RgbaImage;
use tracing::warn;

use crate::payload::ImagePayload;

/// Decodes wire payloads into displayable bitmaps.
#[derive(Debug, Default)]
pub struct FrameDecoder;

impl FrameDecoder {
    pub fn new() -> Self {
        Self
    }

    /// `None` for the empty sentinel and for undecodable data.
    pub fn decode(&self, payload: &ImagePayload) -> Option<RgbaImage> {
        if payload.is_empty() {
            return None;
        }
        match image::load_from_memory(payload.bytes()) {
            Ok(img) => Some(img.to_rgba8()),
            Err(e) => {
                warn!("undecodable frame payload ({} bytes): {e}", payload.len());
                None
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
