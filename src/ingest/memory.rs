//! In-memory video source.
//!
//! Holds a fixed list of frames. A slot may be left undecodable to model a
//! corrupt frame in an otherwise readable video.

use anyhow::{anyhow, Result};
use image::{Rgb, RgbImage};

use super::normalize::rgb_from_raw;
use super::VideoSource;

/// A video held entirely in memory.
#[derive(Default)]
pub struct MemorySource {
    frames: Vec<Option<RgbImage>>,
    reads: u64,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a source from decoded frames.
    pub fn from_frames(frames: Vec<RgbImage>) -> Self {
        Self {
            frames: frames.into_iter().map(Some).collect(),
            reads: 0,
        }
    }

    /// `count` identical frames of a single gray level.
    pub fn uniform(count: usize, width: u32, height: u32, level: u8) -> Self {
        let frame = RgbImage::from_pixel(width, height, Rgb([level, level, level]));
        Self::from_frames(vec![frame; count])
    }

    pub fn push(&mut self, frame: RgbImage) {
        self.frames.push(Some(frame));
    }

    /// Append a frame from a packed RGB24 buffer.
    pub fn push_raw(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<()> {
        let frame = rgb_from_raw(pixels, width, height)?;
        self.frames.push(Some(frame));
        Ok(())
    }

    /// Append a slot that fails to decode.
    pub fn push_corrupt(&mut self) {
        self.frames.push(None);
    }

    /// Number of `read_frame` calls served so far.
    pub fn reads(&self) -> u64 {
        self.reads
    }
}

impl VideoSource for MemorySource {
    fn frame_count(&self) -> u64 {
        self.frames.len() as u64
    }

    fn read_frame(&mut self, index: u64) -> Result<RgbImage> {
        self.reads += 1;
        let slot = usize::try_from(index)
            .ok()
            .and_then(|i| self.frames.get(i))
            .ok_or_else(|| anyhow!("frame {} is out of range", index))?;
        slot.clone()
            .ok_or_else(|| anyhow!("frame {} could not be decoded", index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_frames_by_index() -> Result<()> {
        let mut source = MemorySource::new();
        source.push(RgbImage::from_pixel(2, 2, Rgb([10, 10, 10])));
        source.push_corrupt();
        source.push_raw(&[200u8; 12], 2, 2)?;

        assert_eq!(source.frame_count(), 3);
        assert_eq!(source.read_frame(0)?.get_pixel(0, 0), &Rgb([10, 10, 10]));
        assert!(source.read_frame(1).is_err());
        assert_eq!(source.read_frame(2)?.get_pixel(1, 1), &Rgb([200, 200, 200]));
        assert!(source.read_frame(3).is_err());
        assert_eq!(source.reads(), 4);
        Ok(())
    }
}
