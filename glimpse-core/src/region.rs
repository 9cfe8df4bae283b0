//! Capture regions in desktop-screen coordinates.
//!
//! Screen origins can be negative on multi-monitor layouts, so `x` and
//! `y` are signed while the size is not.

/// A rectangle of the desktop to capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureRegion {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl CaptureRegion {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Clamp this region inside `bounds`, sliding rather than clipping.
    ///
    /// The size is preserved: the origin is first clamped to the bounds
    /// origin, then if the right/bottom edge overflows the bounds the
    /// region is translated left/up by the overflow amount. A region
    /// larger than the bounds ends up aligned to the bottom-right edge.
    pub fn clamp_to(&self, bounds: CaptureRegion) -> CaptureRegion {
        let mut x = self.x.max(bounds.x);
        let mut y = self.y.max(bounds.y);

        let bounds_right = bounds.x + bounds.width as i32;
        let bounds_bottom = bounds.y + bounds.height as i32;

        if x + self.width as i32 > bounds_right {
            x = bounds_right - self.width as i32;
        }
        if y + self.height as i32 > bounds_bottom {
            y = bounds_bottom - self.height as i32;
        }

        CaptureRegion {
            x,
            y,
            width: self.width,
            height: self.height,
        }
    }

    /// Whether the region covers zero pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl std::fmt::Display for CaptureRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

// ── Tests ────────────────────────────────────────────────────────
