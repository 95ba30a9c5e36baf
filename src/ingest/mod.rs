//! Video sources.
//!
//! This module provides seekable sources of decoded frames:
//! - Local video files (FFmpeg decoding behind feature `ingest-file-ffmpeg`)
//! - Synthetic `stub://` files (testing, demos)
//! - In-memory frame lists
//!
//! Every source exposes its total frame count and a seek-and-read-one-frame
//! primitive. The sampler decides which indices to read; sources never decide.
//!
//! Sources MUST NOT:
//! - Store decoded frames to disk
//! - Fetch remote URLs
//! - Log raw frame content

use anyhow::Result;
use image::RgbImage;

pub mod file;
#[cfg(feature = "ingest-file-ffmpeg")]
pub(crate) mod file_ffmpeg;
pub mod memory;
mod normalize;

pub use file::FileSource;
pub use memory::MemorySource;
pub use normalize::rgb_from_raw;

/// A seekable, decodable video.
pub trait VideoSource {
    /// Total number of frames in the video. Zero means the video is empty.
    fn frame_count(&self) -> u64;

    /// Seek to `index` and decode that single frame.
    ///
    /// A failure here concerns this frame only; callers may continue with other indices.
    fn read_frame(&mut self, index: u64) -> Result<RgbImage>;
}

impl<S: VideoSource + ?Sized> VideoSource for Box<S> {
    fn frame_count(&self) -> u64 {
        (**self).frame_count()
    }

    fn read_frame(&mut self, index: u64) -> Result<RgbImage> {
        (**self).read_frame(index)
    }
}
