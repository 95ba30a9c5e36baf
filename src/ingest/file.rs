//! Local file video source.
//!
//! `FileSource` opens a local video file and serves individual frames by index.
//! - `stub://<name>[?frames=N]` paths produce a deterministic synthetic video
//! - Real files are decoded with FFmpeg (feature `ingest-file-ffmpeg`)
//!
//! The file source MUST NOT fetch remote URLs or write decoded frames to disk.

use std::path::Path;

use anyhow::{anyhow, Result};
use image::{Rgb, RgbImage};

#[cfg(feature = "ingest-file-ffmpeg")]
use super::file_ffmpeg::FfmpegFileSource;
use super::VideoSource;

/// Container extensions accepted for local files.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "wmv"];

const STUB_SCHEME: &str = "stub://";
const STUB_DEFAULT_FRAMES: u64 = 300;
const STUB_WIDTH: u32 = 320;
const STUB_HEIGHT: u32 = 240;

/// Local file video source.
pub struct FileSource {
    path: String,
    backend: FileBackend,
}

enum FileBackend {
    Synthetic(SyntheticFileSource),
    #[cfg(feature = "ingest-file-ffmpeg")]
    Ffmpeg(FfmpegFileSource),
}

impl FileSource {
    pub fn open(path: &str) -> Result<Self> {
        validate_video_path(path)?;
        let backend = if let Some(locator) = path.strip_prefix(STUB_SCHEME) {
            FileBackend::Synthetic(SyntheticFileSource::parse(locator)?)
        } else {
            #[cfg(feature = "ingest-file-ffmpeg")]
            {
                FileBackend::Ffmpeg(FfmpegFileSource::open(path)?)
            }
            #[cfg(not(feature = "ingest-file-ffmpeg"))]
            {
                return Err(anyhow!(
                    "file decoding requires the ingest-file-ffmpeg feature"
                ));
            }
        };
        let source = Self {
            path: path.to_string(),
            backend,
        };
        log::info!(
            "FileSource: opened {} ({} frames)",
            source.path,
            source.frame_count()
        );
        Ok(source)
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl VideoSource for FileSource {
    fn frame_count(&self) -> u64 {
        match &self.backend {
            FileBackend::Synthetic(source) => source.frame_count,
            #[cfg(feature = "ingest-file-ffmpeg")]
            FileBackend::Ffmpeg(source) => source.frame_count(),
        }
    }

    fn read_frame(&mut self, index: u64) -> Result<RgbImage> {
        match &mut self.backend {
            FileBackend::Synthetic(source) => source.read_frame(index),
            #[cfg(feature = "ingest-file-ffmpeg")]
            FileBackend::Ffmpeg(source) => source.read_frame(index),
        }
    }
}

/// Reject remote URLs and unsupported container extensions.
pub fn validate_video_path(path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(anyhow!("no file name provided"));
    }
    if path.starts_with(STUB_SCHEME) {
        return Ok(());
    }
    if path.contains("://") {
        return Err(anyhow!(
            "file ingestion only supports local paths (no URL schemes)"
        ));
    }
    let extension = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(anyhow!(
            "invalid file format. Allowed formats: {}",
            SUPPORTED_EXTENSIONS
                .iter()
                .map(|ext| format!(".{}", ext))
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }
    Ok(())
}

// ----------------------------------------------------------------------------
// Synthetic source (stub://) for tests
// ----------------------------------------------------------------------------

struct SyntheticFileSource {
    frame_count: u64,
}

impl SyntheticFileSource {
    fn parse(locator: &str) -> Result<Self> {
        let frame_count = match locator.split_once("?frames=") {
            Some((_, count)) => count
                .parse()
                .map_err(|_| anyhow!("stub frame count must be an integer, got '{}'", count))?,
            None => STUB_DEFAULT_FRAMES,
        };
        Ok(Self { frame_count })
    }

    fn read_frame(&self, index: u64) -> Result<RgbImage> {
        if index >= self.frame_count {
            return Err(anyhow!(
                "frame {} is past the end of a {}-frame video",
                index,
                self.frame_count
            ));
        }
        // Mid-range gradient that drifts slowly so every frame passes the brightness filter.
        let shift = (index % 64) as u32;
        Ok(RgbImage::from_fn(STUB_WIDTH, STUB_HEIGHT, |x, y| {
            let base = 64 + ((x + y + shift) % 128) as u8;
            Rgb([base, base, base])
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_known_extensions_case_insensitively() {
        assert!(validate_video_path("clip.mp4").is_ok());
        assert!(validate_video_path("/tmp/Holiday.MOV").is_ok());
        assert!(validate_video_path("stub://front").is_ok());
    }

    #[test]
    fn rejects_urls_and_unknown_formats() {
        assert!(validate_video_path("").is_err());
        assert!(validate_video_path("https://example.com/clip.mp4").is_err());
        assert!(validate_video_path("notes.txt").is_err());
        assert!(validate_video_path("no_extension").is_err());
    }

    #[test]
    fn stub_source_honours_frame_count() -> Result<()> {
        let mut source = FileSource::open("stub://clip?frames=12")?;
        assert_eq!(source.path(), "stub://clip?frames=12");
        assert_eq!(source.frame_count(), 12);
        assert_eq!(source.read_frame(11)?.dimensions(), (STUB_WIDTH, STUB_HEIGHT));
        assert!(source.read_frame(12).is_err());
        Ok(())
    }

    #[test]
    fn stub_source_rejects_bad_frame_count() {
        assert!(FileSource::open("stub://clip?frames=many").is_err());
    }
}
