//! Shared viewport state — the single piece of cross-context mutable
//! data in the core.
//!
//! The UI context mutates it in response to gestures (pan dragging,
//! region resize) and must never block on network I/O; the session
//! reads a consistent snapshot once per cycle. All access goes through
//! one std `Mutex` with short critical sections — a half-updated offset
//! pair would desynchronize the capture region from the device pan.

use std::sync::{Arc, Mutex};

use crate::region::CaptureRegion;

/// A consistent view of the state, taken under the lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportSnapshot {
    pub pan_x: u32,
    pub pan_y: u32,
    /// Most recently negotiated remote size, `(0, 0)` before the first
    /// cycle settles one.
    pub width: u32,
    pub height: u32,
    pub region: CaptureRegion,
}

#[derive(Debug)]
struct Inner {
    pan_x: u32,
    pan_y: u32,
    width: u32,
    height: u32,
    region: CaptureRegion,
}

/// Cheaply cloneable handle; all clones share one lock.
#[derive(Debug, Clone)]
pub struct SharedViewport {
    inner: Arc<Mutex<Inner>>,
}

impl SharedViewport {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                pan_x: 0,
                pan_y: 0,
                width: 0,
                height: 0,
                region: CaptureRegion::new(0, 0, 0, 0),
            })),
        }
    }

    /// Snapshot everything in one lock acquisition.
    pub fn snapshot(&self) -> ViewportSnapshot {
        let inner = self.inner.lock().expect("viewport lock poisoned");
        ViewportSnapshot {
            pan_x: inner.pan_x,
            pan_y: inner.pan_y,
            width: inner.width,
            height: inner.height,
            region: inner.region,
        }
    }

    /// Update the pan offset, clamping both components into `u32`
    /// range. The latest write wins; there is no queuing of pending
    /// updates.
    pub fn set_pan_offset(&self, x: i64, y: i64) {
        let mut inner = self.inner.lock().expect("viewport lock poisoned");
        inner.pan_x = x.clamp(0, u32::MAX as i64) as u32;
        inner.pan_y = y.clamp(0, u32::MAX as i64) as u32;
    }

    /// Replace the requested capture region.
    pub fn set_capture_region(&self, region: CaptureRegion) {
        let mut inner = self.inner.lock().expect("viewport lock poisoned");
        inner.region = region;
    }

    /// Record the size most recently seen on the wire.
    pub fn set_negotiated_size(&self, width: u32, height: u32) {
        let mut inner = self.inner.lock().expect("viewport lock poisoned");
        inner.width = width;
        inner.height = height;
    }

    /// Resize the capture region in place, keeping its origin.
    pub fn resize_region(&self, width: u32, height: u32) {
        let mut inner = self.inner.lock().expect("viewport lock poisoned");
        inner.region.width = width;
        inner.region.height = height;
    }
}

impl Default for SharedViewport {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ────────────────────────────────────────────────────────
