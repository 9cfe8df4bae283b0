//! Responder-side frame encoder.
//!
//! The wire contract guarantees that a non-empty payload decodes to
//! exactly the most recently requested dimensions, so any source whose
//! size differs is resampled (bilinear) before PNG encoding.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{ImageOutputFormat, RgbaImage};

use crate::error::GlimpseError;
use crate::payload::ImagePayload;

/// Scales and PNG-encodes source bitmaps into wire payloads.
#[derive(Debug, Default)]
pub struct FrameEncoder;

impl FrameEncoder {
    pub fn new() -> Self {
        Self
    }

    /// Produce a payload whose decoded dimensions are exactly
    /// `(width, height)`.
    pub fn encode(
        &self,
        source: &RgbaImage,
        width: u32,
        height: u32,
    ) -> Result<ImagePayload, GlimpseError> {
        if width == 0 || height == 0 {
            return Err(GlimpseError::Encode(format!(
                "degenerate target size {width}x{height}"
            )));
        }

        let mut out = Cursor::new(Vec::new());
        if source.dimensions() == (width, height) {
            source
                .write_to(&mut out, ImageOutputFormat::Png)
                .map_err(|e| GlimpseError::Encode(format!("png encode: {e}")))?;
        } else {
            let resized = image::imageops::resize(source, width, height, FilterType::Triangle);
            resized
                .write_to(&mut out, ImageOutputFormat::Png)
                .map_err(|e| GlimpseError::Encode(format!("png encode: {e}")))?;
        }

        Ok(ImagePayload::new(out.into_inner()))
    }
}

// ── Tests ────────────────────────────────────────────────────────
