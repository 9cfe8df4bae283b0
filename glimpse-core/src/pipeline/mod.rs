//! Image pipeline: produce an encoded payload for a requested viewport
//! size from a live capture or a fixed still image, and decode received
//! payloads back into displayable bitmaps.
//!
//! Pipeline failures never bubble into the session cycle: an absent
//! source, a failed capture, or a malformed payload all degrade to the
//! "no image" side of the protocol.

pub mod capture;
pub mod decoder;
pub mod encoder;

use std::sync::{Arc, Mutex};

use image::RgbaImage;

use crate::error::GlimpseError;
use crate::region::CaptureRegion;

pub use capture::ScreenSource;
pub use decoder::FrameDecoder;
pub use encoder::FrameEncoder;

// ── SourceProvider ───────────────────────────────────────────────

/// Where responder frames come from, selectable at runtime.
///
/// `Ok(None)` means "no source chosen" and maps to the empty-payload
/// sentinel; `Err` is a capture failure, which the session also
/// degrades to the sentinel.
pub trait SourceProvider: Send {
    fn frame(&mut self, region: CaptureRegion) -> Result<Option<RgbaImage>, GlimpseError>;
}

// ── StillSource ──────────────────────────────────────────────────

/// A fixed still image, swappable at runtime.
///
/// The UI keeps a clone and calls [`set_image`](Self::set_image) when
/// the user picks a file; the session polls through [`SourceProvider`].
/// The capture region is ignored — the whole image is the source.
#[derive(Debug, Clone, Default)]
pub struct StillSource {
    image: Arc<Mutex<Option<RgbaImage>>>,
}

impl StillSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// A source pre-loaded with `image`.
    pub fn with_image(image: RgbaImage) -> Self {
        let source = Self::new();
        source.set_image(image);
        source
    }

    /// Replace the current image.
    pub fn set_image(&self, image: RgbaImage) {
        *self.image.lock().expect("still source lock poisoned") = Some(image);
    }

    /// Drop the current image; subsequent frames report "no source".
    pub fn clear(&self) {
        *self.image.lock().expect("still source lock poisoned") = None;
    }
}

impl SourceProvider for StillSource {
    fn frame(&mut self, _region: CaptureRegion) -> Result<Option<RgbaImage>, GlimpseError> {
        Ok(self.image.lock().expect("still source lock poisoned").clone())
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn still_source_starts_empty() {
        let mut source = StillSource::new();
        let frame = source.frame(CaptureRegion::new(0, 0, 10, 10)).unwrap();
        assert!(frame.is_none());
    }

    #[test]
    fn still_source_swaps_at_runtime() {
        let mut source = StillSource::new();
        let handle = source.clone();

        handle.set_image(RgbaImage::new(4, 4));
        let frame = source.frame(CaptureRegion::new(0, 0, 1, 1)).unwrap();
        assert_eq!(frame.unwrap().dimensions(), (4, 4));

        handle.clear();
        assert!(source.frame(CaptureRegion::new(0, 0, 1, 1)).unwrap().is_none());
    }
}
