//! Analysis pipeline.
//!
//! `Analyzer` is the single entry point for callers: sample frames, detect
//! objects per frame, aggregate per-class statistics and infer the activity.
//!
//! Per-frame detection can run on a bounded worker pool. Results are always
//! consumed in frame-index order, so the output does not depend on which
//! worker finishes first.

use std::sync::Arc;

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::activity::{ActivityInferencer, ActivityTier};
use crate::adapter::{AdapterConfig, DetectionAdapter, FrameDetections};
use crate::aggregate::{aggregate, ClassStat};
use crate::detect::{BackendRegistry, Detection, ObjectDetector};
use crate::error::AnalysisError;
use crate::frame::FrameSample;
use crate::ingest::VideoSource;
use crate::sampling::{FrameSampler, SamplerConfig};

/// Default number of classes exposed in reports.
pub const DEFAULT_TOP_CLASSES: usize = 5;

/// Everything the analyzer needs besides the detector.
#[derive(Clone, Debug, PartialEq)]
pub struct AnalysisConfig {
    pub sampling: SamplerConfig,
    pub detection: AdapterConfig,
    pub activity_tier: ActivityTier,
    /// How many ranked classes a report exposes.
    pub top_classes: usize,
    /// Worker threads for per-frame detection; 1 runs inline.
    pub detection_workers: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sampling: SamplerConfig::default(),
            detection: AdapterConfig::default(),
            activity_tier: ActivityTier::default(),
            top_classes: DEFAULT_TOP_CLASSES,
            detection_workers: 1,
        }
    }
}

/// Outcome of one successful analysis run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Every detected class, most frequent first.
    pub ranked_stats: Vec<ClassStat>,
    pub activity_description: String,
    pub frames_processed: usize,
    pub total_detections: usize,
}

/// Runs the full sample → detect → aggregate → infer pipeline.
pub struct Analyzer {
    detector: Arc<dyn ObjectDetector>,
    config: AnalysisConfig,
    pool: Option<rayon::ThreadPool>,
}

impl Analyzer {
    pub fn new(detector: Arc<dyn ObjectDetector>, config: AnalysisConfig) -> Result<Self> {
        let pool = if config.detection_workers > 1 {
            Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(config.detection_workers)
                    .thread_name(|i| format!("detect-{}", i))
                    .build()
                    .context("failed to build detection worker pool")?,
            )
        } else {
            None
        };
        Ok(Self {
            detector,
            config,
            pool,
        })
    }

    /// Resolve the detector from `registry`; a missing backend is `DetectorUnavailable`.
    pub fn from_registry(
        registry: &BackendRegistry,
        backend: Option<&str>,
        config: AnalysisConfig,
    ) -> Result<Self, AnalysisError> {
        let detector = registry.resolve(backend)?;
        Self::new(detector, config)
            .map_err(|e| AnalysisError::detector_unavailable(format!("{:#}", e)))
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn detector_name(&self) -> &'static str {
        self.detector.name()
    }

    /// Analyze with the configured frame budget and confidence threshold.
    pub fn run(&self, source: &mut dyn VideoSource) -> Result<AnalysisResult, AnalysisError> {
        self.analyze(
            source,
            self.config.sampling.max_frames,
            self.config.detection.confidence_threshold,
        )
    }

    /// Analyze `source`, sampling at most `max_frames` frames and keeping
    /// detections at or above `confidence_threshold`.
    pub fn analyze(
        &self,
        source: &mut dyn VideoSource,
        max_frames: usize,
        confidence_threshold: f32,
    ) -> Result<AnalysisResult, AnalysisError> {
        let sampler = FrameSampler::new(SamplerConfig {
            max_frames,
            ..self.config.sampling.clone()
        });
        let adapter = DetectionAdapter::new(AdapterConfig {
            confidence_threshold,
            ..self.config.detection.clone()
        });

        let frames = sampler.sample(source)?;
        let frames_processed = frames.len();

        let per_frame = self.detect_all(&adapter, &frames);
        drop(frames);

        let failed = per_frame.iter().filter(|f| f.is_failed()).count();
        if failed > 0 {
            log::warn!(
                "Analyzer: detector failed on {} of {} frames",
                failed,
                frames_processed
            );
        }
        for frame in &per_frame {
            log::debug!(
                "Analyzer: frame {} -> {} objects",
                frame.frame_index,
                frame.detections().len()
            );
        }

        let detections: Vec<Detection> = per_frame
            .into_iter()
            .flat_map(FrameDetections::into_detections)
            .collect();
        if detections.is_empty() {
            log::warn!("Analyzer: no objects detected in any frame");
            return Err(AnalysisError::NoDetections);
        }

        let ranked_stats = aggregate(&detections);
        let activity_description =
            ActivityInferencer::new(self.config.activity_tier).infer(&detections);
        log::info!(
            "Analyzer: {} objects across {} frames: {}",
            detections.len(),
            frames_processed,
            activity_description
        );

        Ok(AnalysisResult {
            ranked_stats,
            activity_description,
            frames_processed,
            total_detections: detections.len(),
        })
    }

    /// Detection outcomes in the same order as `frames`.
    fn detect_all(&self, adapter: &DetectionAdapter, frames: &[FrameSample]) -> Vec<FrameDetections> {
        let detector = self.detector.as_ref();
        match &self.pool {
            Some(pool) => pool.install(|| {
                frames
                    .par_iter()
                    .map(|frame| adapter.detect_frame(detector, frame))
                    .collect()
            }),
            None => frames
                .iter()
                .map(|frame| adapter.detect_frame(detector, frame))
                .collect(),
        }
    }
}
