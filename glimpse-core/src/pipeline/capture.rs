//! Live screen capture source.
//!
//! `scrap::Capturer` is `!Send` on X11, so capturers live on a
//! dedicated thread created at open time; capture requests and frames
//! cross over a std mpsc pair. The session side blocks for at most
//! [`CAPTURE_TIMEOUT`] per request — a stuck or dead capture thread is
//! a capture error, which the session degrades to the empty payload.
//!
//! Regions are clamped to the union of all display bounds, so a
//! secondary monitor can be mirrored. scrap's portable API exposes
//! display sizes but not positions, so the layout is taken as left to
//! right from the primary display's origin.

use std::sync::mpsc;
use std::time::{Duration, Instant};

use image::RgbaImage;
use scrap::{Capturer, Display};
use tracing::{debug, warn};

use crate::error::GlimpseError;
use crate::pipeline::SourceProvider;
use crate::region::CaptureRegion;

/// How long a single capture request may take end to end.
const CAPTURE_TIMEOUT: Duration = Duration::from_secs(2);

/// How long to keep retrying `WouldBlock` from the compositor.
const FRAME_DEADLINE: Duration = Duration::from_millis(500);

/// Captures a clamped [`CaptureRegion`] of the desktop displays.
pub struct ScreenSource {
    req_tx: mpsc::Sender<CaptureRegion>,
    frame_rx: mpsc::Receiver<Result<RgbaImage, String>>,
    bounds: CaptureRegion,
}

impl ScreenSource {
    /// Probe the displays and start the capture thread.
    pub fn open() -> Result<Self, GlimpseError> {
        let displays =
            Display::all().map_err(|e| GlimpseError::Capture(format!("no displays: {e}")))?;
        if displays.is_empty() {
            return Err(GlimpseError::Capture("no displays".into()));
        }
        let sizes: Vec<(u32, u32)> = displays
            .iter()
            .map(|d| (d.width() as u32, d.height() as u32))
            .collect();
        let bounds = union_bounds(&sizes);
        // Capturers are created inside the thread (!Send on X11).
        drop(displays);

        let (req_tx, req_rx) = mpsc::channel::<CaptureRegion>();
        let (frame_tx, frame_rx) = mpsc::channel();

        std::thread::Builder::new()
            .name("glimpse-capture".into())
            .spawn(move || capture_loop(sizes, req_rx, frame_tx))
            .map_err(|e| GlimpseError::Capture(format!("spawn capture thread: {e}")))?;

        debug!(%bounds, "screen source opened");
        Ok(Self {
            req_tx,
            frame_rx,
            bounds,
        })
    }

    /// The union of all display bounds requested regions are clamped
    /// into.
    pub fn bounds(&self) -> CaptureRegion {
        self.bounds
    }
}

impl SourceProvider for ScreenSource {
    fn frame(&mut self, region: CaptureRegion) -> Result<Option<RgbaImage>, GlimpseError> {
        if region.is_empty() {
            return Ok(None);
        }
        let clamped = region.clamp_to(self.bounds);

        self.req_tx
            .send(clamped)
            .map_err(|_| GlimpseError::Capture("capture thread gone".into()))?;

        // recv_timeout parks the calling thread, so take the wait off
        // the async worker.
        let received =
            tokio::task::block_in_place(|| self.frame_rx.recv_timeout(CAPTURE_TIMEOUT));
        match received {
            Ok(Ok(image)) => Ok(Some(image)),
            Ok(Err(e)) => Err(GlimpseError::Capture(e)),
            Err(_) => Err(GlimpseError::Capture("capture request timed out".into())),
        }
    }
}

// ── Display layout ───────────────────────────────────────────────

/// Bounding box of all displays laid out left to right.
fn union_bounds(sizes: &[(u32, u32)]) -> CaptureRegion {
    let width = sizes.iter().map(|s| s.0).sum();
    let height = sizes.iter().map(|s| s.1).max().unwrap_or(0);
    CaptureRegion::new(0, 0, width, height)
}

/// Which display the region's origin falls on, and the region
/// translated into that display's local coordinates. Regions past the
/// last display stay on it; the padding path covers the overhang.
fn locate(sizes: &[(u32, u32)], region: CaptureRegion) -> (usize, CaptureRegion) {
    let mut left = 0i32;
    for (idx, (width, _)) in sizes.iter().enumerate() {
        let right = left + *width as i32;
        if region.x < right || idx == sizes.len() - 1 {
            return (
                idx,
                CaptureRegion::new(region.x - left, region.y, region.width, region.height),
            );
        }
        left = right;
    }
    (0, region)
}

// ── Capture thread ───────────────────────────────────────────────

struct ActiveCapturer {
    index: usize,
    capturer: Capturer,
    width: usize,
    height: usize,
}

fn open_capturer(index: usize) -> Result<ActiveCapturer, String> {
    let mut displays = Display::all().map_err(|e| format!("no displays: {e}"))?;
    if index >= displays.len() {
        return Err("display layout changed".into());
    }
    let display = displays.remove(index);
    let (width, height) = (display.width(), display.height());
    let capturer = Capturer::new(display).map_err(|e| format!("start capturer: {e}"))?;
    Ok(ActiveCapturer {
        index,
        capturer,
        width,
        height,
    })
}

fn capture_loop(
    sizes: Vec<(u32, u32)>,
    req_rx: mpsc::Receiver<CaptureRegion>,
    frame_tx: mpsc::Sender<Result<RgbaImage, String>>,
) {
    let mut active: Option<ActiveCapturer> = None;

    // Exits when the source handle is dropped and the channel closes.
    while let Ok(region) = req_rx.recv() {
        let (index, local) = locate(&sizes, region);

        if active.as_ref().map(|a| a.index) != Some(index) {
            active = match open_capturer(index) {
                Ok(a) => Some(a),
                Err(e) => {
                    warn!("capture thread: {e}");
                    if frame_tx.send(Err(e)).is_err() {
                        break;
                    }
                    continue;
                }
            };
        }
        let a = active.as_mut().expect("capturer just opened");

        let result = grab_region(&mut a.capturer, a.width, a.height, local);
        if frame_tx.send(result).is_err() {
            break;
        }
    }
}

/// Grab one display frame and crop `region` out of it as RGBA.
fn grab_region(
    capturer: &mut Capturer,
    src_w: usize,
    src_h: usize,
    region: CaptureRegion,
) -> Result<RgbaImage, String> {
    let deadline = Instant::now() + FRAME_DEADLINE;

    let frame = loop {
        match capturer.frame() {
            Ok(frame) => break frame.to_vec(),
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                // Compositor has no new frame yet.
                if Instant::now() >= deadline {
                    return Err("no frame from compositor".into());
                }
                std::thread::sleep(Duration::from_millis(5));
            }
            Err(e) => return Err(format!("capture failed: {e}")),
        }
    };

    // scrap hands back BGRA rows; the stride may include padding.
    let stride = frame.len() / src_h;
    let mut out = Vec::with_capacity(region.width as usize * region.height as usize * 4);

    for dy in 0..region.height {
        let src_y = region.y + dy as i32;
        for dx in 0..region.width {
            let src_x = region.x + dx as i32;
            if src_y < 0 || src_x < 0 || src_y as usize >= src_h || src_x as usize >= src_w {
                // Region slid past the display edge — pad with black.
                out.extend_from_slice(&[0, 0, 0, 255]);
                continue;
            }
            let offset = src_y as usize * stride + src_x as usize * 4;
            if offset + 3 < frame.len() {
                out.push(frame[offset + 2]); // R
                out.push(frame[offset + 1]); // G
                out.push(frame[offset]); // B
                out.push(255);
            } else {
                out.extend_from_slice(&[0, 0, 0, 255]);
            }
        }
    }

    RgbaImage::from_raw(region.width, region.height, out)
        .ok_or_else(|| "crop produced an invalid buffer".into())
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_spans_all_displays() {
        let bounds = union_bounds(&[(1920, 1080), (1280, 1024)]);
        assert_eq!(bounds, CaptureRegion::new(0, 0, 3200, 1080));
    }

    #[test]
    fn single_display_union_is_its_bounds() {
        let bounds = union_bounds(&[(1920, 1080)]);
        assert_eq!(bounds, CaptureRegion::new(0, 0, 1920, 1080));
    }

    #[test]
    fn primary_regions_stay_in_primary_coordinates() {
        let sizes = [(1920, 1080), (1280, 1024)];
        let (index, local) = locate(&sizes, CaptureRegion::new(100, 200, 480, 800));
        assert_eq!(index, 0);
        assert_eq!(local, CaptureRegion::new(100, 200, 480, 800));
    }

    #[test]
    fn secondary_regions_translate_to_local_coordinates() {
        let sizes = [(1920, 1080), (1280, 1024)];
        let (index, local) = locate(&sizes, CaptureRegion::new(2000, 100, 480, 800));
        assert_eq!(index, 1);
        assert_eq!(local, CaptureRegion::new(80, 100, 480, 800));
    }

    #[test]
    fn region_past_the_last_display_stays_on_it() {
        let sizes = [(1920, 1080), (1280, 1024)];
        let (index, local) = locate(&sizes, CaptureRegion::new(4000, 0, 100, 100));
        assert_eq!(index, 1);
        assert_eq!(local.x, 2080);
    }

    /// Channel pair standing in for the capture thread.
    fn fake_source(bounds: CaptureRegion) -> ScreenSource {
        let (req_tx, req_rx) = mpsc::channel::<CaptureRegion>();
        let (frame_tx, frame_rx) = mpsc::channel();
        std::thread::spawn(move || {
            while let Ok(region) = req_rx.recv() {
                let image = RgbaImage::new(region.width, region.height);
                if frame_tx.send(Ok(image)).is_err() {
                    break;
                }
            }
        });
        ScreenSource {
            req_tx,
            frame_rx,
            bounds,
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn frame_waits_off_the_async_worker() {
        let mut source = fake_source(CaptureRegion::new(0, 0, 800, 600));
        let frame = source
            .frame(CaptureRegion::new(10, 10, 64, 48))
            .unwrap()
            .unwrap();
        assert_eq!(frame.dimensions(), (64, 48));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn dead_capture_thread_is_a_capture_error() {
        let (req_tx, req_rx) = mpsc::channel::<CaptureRegion>();
        let (frame_tx, frame_rx) = mpsc::channel::<Result<RgbaImage, String>>();
        drop(req_rx);
        drop(frame_tx);
        let mut source = ScreenSource {
            req_tx,
            frame_rx,
            bounds: CaptureRegion::new(0, 0, 800, 600),
        };
        let err = source.frame(CaptureRegion::new(0, 0, 10, 10)).unwrap_err();
        assert!(matches!(err, GlimpseError::Capture(_)));
    }
}
