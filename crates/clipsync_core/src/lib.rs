//! Clip Sync Core - audio alignment engine.
//!
//! Computes the time offset that best aligns the audio of two clips of the
//! same event. Decoding, timelines and UI live elsewhere; this crate works
//! on already-decoded mono sample buffers.

pub mod alignment;
pub mod config;
pub mod logging;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
