//! Sampled frames and frame-quality measurement.
//!
//! - `FrameSample`: one decoded frame selected by the sampler, with its source index
//!   and mean luminance.
//! - `BrightnessWindow`: the accepted luminance range for the frame-quality filter.
//!
//! Frames are consumed by the detection stage and dropped at the end of the run.
//! Nothing in this module writes pixels anywhere.

use image::RgbImage;
use serde::{Deserialize, Serialize};

/// Default lower luminance bound (exclusive). Frames at or below this are treated as too dark.
pub const DEFAULT_MIN_BRIGHTNESS: f32 = 20.0;

/// Default upper luminance bound (exclusive). Frames at or above this are treated as blown out.
pub const DEFAULT_MAX_BRIGHTNESS: f32 = 235.0;

// ----------------------------------------------------------------------------
// FrameSample
// ----------------------------------------------------------------------------

/// A decoded frame selected for analysis.
///
/// There is no `Clone`; a sample moves from the sampler to the detection stage
/// and is dropped there.
#[derive(Debug)]
pub struct FrameSample {
    /// Position of the frame in the source video.
    pub index: u64,
    pixels: RgbImage,
    /// Mean luminance on a 0..=255 scale.
    pub mean_brightness: f32,
}

impl FrameSample {
    /// Build a sample, measuring its brightness.
    pub fn new(index: u64, pixels: RgbImage) -> Self {
        let mean_brightness = mean_luminance(&pixels);
        Self {
            index,
            pixels,
            mean_brightness,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }
}

/// Mean luminance of an RGB image using ITU-R BT.601 weights.
///
/// Returns 0.0 for an empty image.
pub fn mean_luminance(image: &RgbImage) -> f32 {
    let count = u64::from(image.width()) * u64::from(image.height());
    if count == 0 {
        return 0.0;
    }
    let sum: f64 = image
        .pixels()
        .map(|p| {
            0.299 * f64::from(p[0]) + 0.587 * f64::from(p[1]) + 0.114 * f64::from(p[2])
        })
        .sum();
    (sum / count as f64) as f32
}

// ----------------------------------------------------------------------------
// BrightnessWindow
// ----------------------------------------------------------------------------

/// Open luminance interval a frame must fall into to be kept.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BrightnessWindow {
    pub min: f32,
    pub max: f32,
}

impl BrightnessWindow {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// True when `brightness` lies strictly between the bounds.
    pub fn accepts(&self, brightness: f32) -> bool {
        self.min < brightness && brightness < self.max
    }
}

impl Default for BrightnessWindow {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_BRIGHTNESS,
            max: DEFAULT_MAX_BRIGHTNESS,
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn solid(value: u8) -> RgbImage {
        RgbImage::from_pixel(8, 6, Rgb([value, value, value]))
    }

    #[test]
    fn luminance_of_solid_frames() {
        assert!(mean_luminance(&solid(0)) < 0.5);
        assert!((mean_luminance(&solid(128)) - 128.0).abs() < 0.5);
        assert!((mean_luminance(&solid(255)) - 255.0).abs() < 0.5);
    }

    #[test]
    fn luminance_weights_green_highest() {
        let red = RgbImage::from_pixel(2, 2, Rgb([255, 0, 0]));
        let green = RgbImage::from_pixel(2, 2, Rgb([0, 255, 0]));
        let blue = RgbImage::from_pixel(2, 2, Rgb([0, 0, 255]));
        assert!(mean_luminance(&green) > mean_luminance(&red));
        assert!(mean_luminance(&red) > mean_luminance(&blue));
    }

    #[test]
    fn default_window_rejects_extremes() {
        let window = BrightnessWindow::default();
        assert!(!window.accepts(0.0));
        assert!(!window.accepts(20.0));
        assert!(window.accepts(128.0));
        assert!(!window.accepts(235.0));
        assert!(!window.accepts(255.0));
    }

    #[test]
    fn sample_records_index_and_brightness() {
        let sample = FrameSample::new(42, solid(100));
        assert_eq!(sample.index, 42);
        assert_eq!(sample.width(), 8);
        assert_eq!(sample.height(), 6);
        assert!((sample.mean_brightness - 100.0).abs() < 0.5);
    }
}
