//! Frame sampling.
//!
//! Picks a bounded set of representative frame indices from a video, decodes
//! them and drops low-information frames.
//!
//! Two policies are supported:
//! - `Banded`: splits the budget 30/40/30 across a beginning band, the middle
//!   half of the timeline and an end band.
//! - `Uniform`: fixed stride of `total / max_frames`.
//!
//! Indices are always strictly increasing and unique. A frame that fails to
//! decode is skipped; only an empty video or a run with zero accepted frames
//! is an error.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::frame::{BrightnessWindow, FrameSample};
use crate::ingest::VideoSource;

/// Default frame budget per video.
pub const DEFAULT_MAX_FRAMES: usize = 15;

/// How frame indices are chosen when the video is longer than the budget.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SamplingPolicy {
    /// Beginning / middle / end coverage bands.
    #[default]
    Banded,
    /// Evenly strided from the first frame.
    Uniform,
}

impl std::str::FromStr for SamplingPolicy {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> anyhow::Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "banded" => Ok(Self::Banded),
            "uniform" => Ok(Self::Uniform),
            other => Err(anyhow::anyhow!(
                "unknown sampling policy '{}' (expected banded or uniform)",
                other
            )),
        }
    }
}

/// Sampler settings.
#[derive(Clone, Debug, PartialEq)]
pub struct SamplerConfig {
    pub max_frames: usize,
    pub policy: SamplingPolicy,
    /// Frame-quality filter; `None` keeps every decoded frame.
    pub brightness: Option<BrightnessWindow>,
}

impl SamplerConfig {
    /// Uniform stride without the quality filter.
    pub fn simple(max_frames: usize) -> Self {
        Self {
            max_frames,
            policy: SamplingPolicy::Uniform,
            brightness: None,
        }
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            max_frames: DEFAULT_MAX_FRAMES,
            policy: SamplingPolicy::Banded,
            brightness: Some(BrightnessWindow::default()),
        }
    }
}

/// Selects and decodes frames from a video source.
#[derive(Clone, Debug, Default)]
pub struct FrameSampler {
    config: SamplerConfig,
}

impl FrameSampler {
    pub fn new(config: SamplerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Sample up to `max_frames` usable frames from `source`.
    pub fn sample(&self, source: &mut dyn VideoSource) -> Result<Vec<FrameSample>, AnalysisError> {
        let total = source.frame_count();
        if total == 0 {
            log::warn!("FrameSampler: video has no frames");
            return Err(AnalysisError::EmptySource);
        }
        let max_frames = self.config.max_frames.max(1);
        let indices = plan_indices(total, max_frames, self.config.policy);
        log::debug!(
            "FrameSampler: {} candidate indices from {} frames ({:?})",
            indices.len(),
            total,
            self.config.policy
        );

        let mut frames = Vec::with_capacity(max_frames.min(indices.len()));
        for index in indices {
            let pixels = match source.read_frame(index) {
                Ok(pixels) => pixels,
                Err(e) => {
                    log::warn!("FrameSampler: failed to read frame {}: {:#}", index, e);
                    continue;
                }
            };
            let sample = FrameSample::new(index, pixels);
            if let Some(window) = &self.config.brightness {
                if !window.accepts(sample.mean_brightness) {
                    log::debug!(
                        "FrameSampler: skipping frame {} (brightness {:.1})",
                        index,
                        sample.mean_brightness
                    );
                    continue;
                }
            }
            frames.push(sample);
            if frames.len() >= max_frames {
                break;
            }
        }

        if frames.is_empty() {
            log::warn!("FrameSampler: no usable frames in {} total", total);
            return Err(AnalysisError::NoUsableFrames);
        }
        log::info!("FrameSampler: extracted {} frames", frames.len());
        Ok(frames)
    }
}

/// Frame indices to read, strictly increasing and below `total`.
pub fn plan_indices(total: u64, max_frames: usize, policy: SamplingPolicy) -> Vec<u64> {
    let budget = max_frames as u64;
    if total == 0 || budget == 0 {
        return Vec::new();
    }
    if total <= budget {
        return (0..total).collect();
    }
    match policy {
        SamplingPolicy::Banded => banded_indices(total, budget),
        SamplingPolicy::Uniform => uniform_indices(total, budget),
    }
}

fn uniform_indices(total: u64, budget: u64) -> Vec<u64> {
    let step = (total / budget).max(1);
    (0..budget)
        .map(|i| i * step)
        .take_while(|&index| index < total)
        .collect()
}

fn banded_indices(total: u64, budget: u64) -> Vec<u64> {
    let start_frames = budget * 3 / 10;
    let middle_frames = budget * 4 / 10;
    let end_frames = budget - start_frames - middle_frames;

    let mut indices = BTreeSet::new();

    for i in 0..start_frames {
        indices.insert(i * total / start_frames);
    }

    let middle_start = total / 4;
    let middle_end = 3 * total / 4;
    for i in 0..middle_frames {
        indices.insert(middle_start + i * (middle_end - middle_start) / middle_frames);
    }

    for i in 0..end_frames {
        indices.insert(total - (end_frames - i) * total / end_frames);
    }

    indices.into_iter().filter(|&index| index < total).collect()
}
