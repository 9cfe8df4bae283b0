//! # glimpse-desktop — Desktop Responder
//!
//! Foreground service that mirrors a region of the desktop screen (or a
//! still image file) to a connected device. It dials the device through
//! a forwarded local port, answers each viewport request with a freshly
//! captured, scaled and PNG-encoded frame, and keeps retrying the
//! connection until stopped.
//!
//! The port forward itself is delegated to an external command
//! (typically `adb forward`), re-run after every failed connection
//! attempt.

pub mod config;
pub mod tunnel;
