//! Local file video source using FFmpeg.
//!
//! Frames are addressed by index. Each read seeks to the nearest keyframe before
//! the target, then decodes forward until the frame whose presentation timestamp
//! reaches the target. Decoded frames are converted to RGB in memory.

use anyhow::{anyhow, Context, Result};
use ffmpeg_next as ffmpeg;
use image::RgbImage;

use super::normalize::rgb_from_raw;

pub(crate) struct FfmpegFileSource {
    path: String,
    input: ffmpeg::format::context::Input,
    stream_index: usize,
    decoder: ffmpeg::codec::decoder::Video,
    scaler: ffmpeg::software::scaling::Context,
    frame_count: u64,
    fps: f64,
    time_base: f64,
    start_pts: i64,
}

impl FfmpegFileSource {
    pub(crate) fn open(path: &str) -> Result<Self> {
        ffmpeg::init().context("initialize ffmpeg")?;
        let input = ffmpeg::format::input(&path)
            .with_context(|| format!("could not open video file '{}'", path))?;
        let input_stream = input
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or_else(|| anyhow!("file has no video track"))?;
        let stream_index = input_stream.index();
        let fps = f64::from(input_stream.avg_frame_rate());
        let time_base = f64::from(input_stream.time_base());
        let start_pts = match input_stream.start_time() {
            ffmpeg::ffi::AV_NOPTS_VALUE => 0,
            start => start,
        };
        let declared_frames = input_stream.frames();
        let context = ffmpeg::codec::context::Context::from_parameters(input_stream.parameters())
            .context("load video decoder parameters")?;
        let decoder = context
            .decoder()
            .video()
            .context("open ffmpeg video decoder")?;

        let scaler = ffmpeg::software::scaling::context::Context::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            ffmpeg::util::format::pixel::Pixel::RGB24,
            decoder.width(),
            decoder.height(),
            ffmpeg::software::scaling::flag::Flags::BILINEAR,
        )
        .context("create ffmpeg scaler")?;

        let frame_count = if declared_frames > 0 {
            declared_frames as u64
        } else {
            estimate_frame_count(input.duration(), fps)
        };
        log::debug!(
            "FileSource: {} has {} frames at {:.2} fps",
            path,
            frame_count,
            fps
        );

        Ok(Self {
            path: path.to_string(),
            input,
            stream_index,
            decoder,
            scaler,
            frame_count,
            fps,
            time_base,
            start_pts,
        })
    }

    pub(crate) fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub(crate) fn read_frame(&mut self, index: u64) -> Result<RgbImage> {
        if self.fps <= 0.0 || self.time_base <= 0.0 {
            return Err(anyhow!("{} has no usable frame rate", self.path));
        }
        let target = FrameTarget::new(index, self.fps, self.time_base, self.start_pts);

        self.input
            .seek(target.seek_us, ..target.seek_us)
            .with_context(|| format!("seek to frame {}", index))?;
        self.decoder.flush();

        let mut decoded = ffmpeg::frame::Video::empty();
        let mut rgb_frame = ffmpeg::frame::Video::empty();

        for (stream, packet) in self.input.packets() {
            if stream.index() != self.stream_index {
                continue;
            }

            self.decoder
                .send_packet(&packet)
                .context("send packet to ffmpeg decoder")?;

            if let Some(image) = receive_target(
                &mut self.decoder,
                &mut self.scaler,
                target.pts,
                &mut decoded,
                &mut rgb_frame,
            )? {
                return Ok(image);
            }
        }

        // Reordering decoders hold back the last frames until end of stream.
        self.decoder
            .send_eof()
            .context("send eof to ffmpeg decoder")?;
        if let Some(image) = receive_target(
            &mut self.decoder,
            &mut self.scaler,
            target.pts,
            &mut decoded,
            &mut rgb_frame,
        )? {
            return Ok(image);
        }

        Err(anyhow!("file ended before frame {}", index))
    }
}

/// Seek position and presentation timestamp of one frame index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FrameTarget {
    /// Seek position in `AV_TIME_BASE` units.
    seek_us: i64,
    /// Presentation timestamp in stream time base units.
    pts: i64,
}

impl FrameTarget {
    fn new(index: u64, fps: f64, time_base: f64, start_pts: i64) -> Self {
        let offset = (index as f64 / fps / time_base).round() as i64;
        let pts = start_pts + offset;
        let seek_us = (pts as f64 * time_base * f64::from(ffmpeg::ffi::AV_TIME_BASE)).round() as i64;
        Self { seek_us, pts }
    }
}

/// Pull decoded frames until one reaches `target_pts`; `None` when the decoder needs more input.
fn receive_target(
    decoder: &mut ffmpeg::codec::decoder::Video,
    scaler: &mut ffmpeg::software::scaling::Context,
    target_pts: i64,
    decoded: &mut ffmpeg::frame::Video,
    rgb_frame: &mut ffmpeg::frame::Video,
) -> Result<Option<RgbImage>> {
    while decoder.receive_frame(decoded).is_ok() {
        let pts = decoded.timestamp().unwrap_or(target_pts);
        if pts < target_pts {
            continue;
        }
        scaler.run(decoded, rgb_frame).context("scale frame to RGB")?;
        return frame_to_image(rgb_frame).map(Some);
    }
    Ok(None)
}

fn estimate_frame_count(duration_us: i64, fps: f64) -> u64 {
    if duration_us <= 0 || fps <= 0.0 {
        return 0;
    }
    let seconds = duration_us as f64 / f64::from(ffmpeg::ffi::AV_TIME_BASE);
    (seconds * fps).floor() as u64
}

fn frame_to_image(frame: &ffmpeg::frame::Video) -> Result<RgbImage> {
    let width = frame.width();
    let height = frame.height();
    let row_bytes = (width as usize) * 3;
    let stride = frame.stride(0);
    let data = frame.data(0);

    if stride == row_bytes {
        let len = row_bytes * height as usize;
        let pixels = data
            .get(..len)
            .context("ffmpeg frame is shorter than its dimensions")?;
        return rgb_from_raw(pixels, width, height);
    }

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        let end = start + row_bytes;
        pixels.extend_from_slice(
            data.get(start..end)
                .context("ffmpeg frame row is out of bounds")?,
        );
    }

    rgb_from_raw(&pixels, width, height)
}
