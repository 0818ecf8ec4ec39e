//! Raster rendering of correlation buffers and envelopes for operator review.
//!
//! Pure read-only functions. Every column is one slot / block; bar height is
//! the value divided by the largest absolute value, so plots are
//! scale-invariant. An all-zero input renders as a blank image.

use image::{Rgb, RgbImage};

use super::correlation::CorrelationResult;
use super::types::Envelope;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const POSITIVE_BAR: Rgb<u8> = Rgb([50, 50, 50]);
const NEGATIVE_BAR: Rgb<u8> = Rgb([170, 60, 60]);
const PEAK_BAR: Rgb<u8> = Rgb([40, 120, 220]);

/// Render a correlation buffer.
///
/// Width is `result.size()`, height is `height`. Positive values are drawn
/// dark, negative values (possible with DC removal) in red, and the maximum
/// slot in blue.
pub fn render_correlation(result: &CorrelationResult, height: u32) -> RgbImage {
    let peak_index = if result.max_abs() == 0 {
        None
    } else {
        result.max_index()
    };
    render_bars(result.correlation_vector(), height, peak_index)
}

/// Render an envelope, one column per block.
pub fn render_envelope(envelope: &Envelope, height: u32) -> RgbImage {
    render_bars(envelope.values(), height, None)
}

fn render_bars(values: &[i64], height: u32, highlight: Option<usize>) -> RgbImage {
    let width = values.len() as u32;
    let mut img = RgbImage::from_pixel(width, height, BACKGROUND);

    let max_abs = values.iter().map(|v| v.unsigned_abs()).max().unwrap_or(0);
    if max_abs == 0 || height == 0 {
        return img;
    }

    for (x, &value) in values.iter().enumerate() {
        let bar = bar_height(value.unsigned_abs(), max_abs, height);
        let color = if Some(x) == highlight {
            PEAK_BAR
        } else if value < 0 {
            NEGATIVE_BAR
        } else {
            POSITIVE_BAR
        };
        for y in (height - bar)..height {
            img.put_pixel(x as u32, y, color);
        }
    }

    img
}

/// Scale `magnitude / max_abs` to `0..=height` pixels.
fn bar_height(magnitude: u64, max_abs: u64, height: u32) -> u32 {
    let scaled = (magnitude as u128 * height as u128) / max_abs as u128;
    scaled.min(height as u128) as u32
}
