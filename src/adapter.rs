//! Detection adapter.
//!
//! Runs the detector capability on one sampled frame and turns its raw output
//! into canonical `Detection` records:
//! - Oversize frames are downscaled (aspect preserved) before inference and the
//!   returned boxes mapped back to source-frame pixels.
//! - Results below the confidence threshold are dropped.
//! - Results outside the class allow-list are dropped, when one is configured.
//!
//! A detector error is contained to its frame: the outcome is recorded as
//! `FrameOutcome::Failed` and contributes no detections.

use std::collections::BTreeSet;

use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::detect::{Detection, ObjectDetector, RawDetection};
use crate::frame::FrameSample;

/// Default minimum confidence for a detection to be kept.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.3;

/// Frames wider or taller than this are downscaled before inference.
pub const DEFAULT_MAX_DIMENSIONS: (u32, u32) = (1920, 1080);

/// Classes kept by the default allow-list.
pub const COMMON_CLASSES: &[&str] = &[
    "person",
    "bicycle",
    "car",
    "motorcycle",
    "bus",
    "truck",
    "tv",
    "laptop",
    "cell phone",
    "dog",
    "cat",
    "chair",
    "dining table",
];

/// Which class labels survive filtering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClassFilter {
    /// Keep every label the detector reports.
    Unrestricted,
    /// Keep only these labels.
    Only(BTreeSet<String>),
}

impl ClassFilter {
    /// The commonly relevant person / vehicle / animal / furniture / device set.
    pub fn common() -> Self {
        Self::only(COMMON_CLASSES.iter().copied())
    }

    pub fn only<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Only(labels.into_iter().map(Into::into).collect())
    }

    pub fn allows(&self, label: &str) -> bool {
        match self {
            Self::Unrestricted => true,
            Self::Only(labels) => labels.contains(label),
        }
    }
}

impl Default for ClassFilter {
    fn default() -> Self {
        Self::common()
    }
}

/// Adapter settings.
#[derive(Clone, Debug, PartialEq)]
pub struct AdapterConfig {
    pub confidence_threshold: f32,
    pub class_filter: ClassFilter,
    /// `None` disables downscaling.
    pub max_dimensions: Option<(u32, u32)>,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            class_filter: ClassFilter::default(),
            max_dimensions: Some(DEFAULT_MAX_DIMENSIONS),
        }
    }
}

/// What happened when detection ran on one frame.
#[derive(Clone, Debug, PartialEq)]
pub enum FrameOutcome {
    /// Detection ran; the list may be empty.
    Detected(Vec<Detection>),
    /// The detector failed on this frame.
    Failed(String),
}

/// Detection outcome for one sampled frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameDetections {
    pub frame_index: u64,
    pub outcome: FrameOutcome,
}

impl FrameDetections {
    pub fn detections(&self) -> &[Detection] {
        match &self.outcome {
            FrameOutcome::Detected(detections) => detections,
            FrameOutcome::Failed(_) => &[],
        }
    }

    pub fn into_detections(self) -> Vec<Detection> {
        match self.outcome {
            FrameOutcome::Detected(detections) => detections,
            FrameOutcome::Failed(_) => Vec::new(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, FrameOutcome::Failed(_))
    }
}

/// Applies the detector to frames and normalizes its output.
#[derive(Clone, Debug, Default)]
pub struct DetectionAdapter {
    config: AdapterConfig,
}

impl DetectionAdapter {
    pub fn new(config: AdapterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Run `detector` on `frame`. Never fails; detector errors become `FrameOutcome::Failed`.
    pub fn detect_frame(&self, detector: &dyn ObjectDetector, frame: &FrameSample) -> FrameDetections {
        let (input, scale) = self.prepare(frame.pixels());
        let outcome = match detector.detect(input.as_ref().unwrap_or(frame.pixels())) {
            Ok(raw) => FrameOutcome::Detected(self.normalize(raw, scale)),
            Err(e) => {
                log::warn!(
                    "DetectionAdapter: detector '{}' failed on frame {}: {:#}",
                    detector.name(),
                    frame.index,
                    e
                );
                FrameOutcome::Failed(format!("{:#}", e))
            }
        };
        FrameDetections {
            frame_index: frame.index,
            outcome,
        }
    }

    /// Downscaled copy (if needed) and the per-axis factors mapping its pixels back to the source.
    fn prepare(&self, pixels: &RgbImage) -> (Option<RgbImage>, (f32, f32)) {
        let Some((max_w, max_h)) = self.config.max_dimensions else {
            return (None, (1.0, 1.0));
        };
        let (w, h) = pixels.dimensions();
        if w <= max_w && h <= max_h {
            return (None, (1.0, 1.0));
        }
        let scale = (max_w as f32 / w as f32).min(max_h as f32 / h as f32);
        let new_w = ((w as f32 * scale) as u32).max(1);
        let new_h = ((h as f32 * scale) as u32).max(1);
        log::debug!(
            "DetectionAdapter: downscaling {}x{} to {}x{}",
            w,
            h,
            new_w,
            new_h
        );
        let resized = imageops::resize(pixels, new_w, new_h, FilterType::Triangle);
        (
            Some(resized),
            (w as f32 / new_w as f32, h as f32 / new_h as f32),
        )
    }

    fn normalize(&self, raw: Vec<RawDetection>, (fx, fy): (f32, f32)) -> Vec<Detection> {
        raw.into_iter()
            .filter(|d| d.confidence >= self.config.confidence_threshold)
            .filter(|d| self.config.class_filter.allows(&d.class_label))
            .map(|d| {
                Detection::new(
                    d.class_label,
                    d.confidence.clamp(0.0, 1.0),
                    d.bounding_box.scaled_xy(fx, fy),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::BoundingBox;
    use anyhow::{anyhow, Result};
    use image::Rgb;
    use std::sync::Mutex;

    struct Fixed(Vec<RawDetection>);

    impl ObjectDetector for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn detect(&self, _frame: &RgbImage) -> Result<Vec<RawDetection>> {
            Ok(self.0.clone())
        }
    }

    struct Broken;

    impl ObjectDetector for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn detect(&self, _frame: &RgbImage) -> Result<Vec<RawDetection>> {
            Err(anyhow!("inference crashed"))
        }
    }

    /// Records the size of each frame it is given and reports one box covering it.
    #[derive(Default)]
    struct SizeRecorder(Mutex<Vec<(u32, u32)>>);

    impl ObjectDetector for SizeRecorder {
        fn name(&self) -> &'static str {
            "recorder"
        }

        fn detect(&self, frame: &RgbImage) -> Result<Vec<RawDetection>> {
            let (w, h) = frame.dimensions();
            self.0.lock().unwrap().push((w, h));
            Ok(vec![RawDetection::new(
                "person",
                0.9,
                BoundingBox::new(0.0, 0.0, w as f32, h as f32),
            )])
        }
    }

    fn frame(width: u32, height: u32) -> FrameSample {
        FrameSample::new(3, RgbImage::from_pixel(width, height, Rgb([90, 90, 90])))
    }

    fn raw(label: &str, confidence: f32) -> RawDetection {
        RawDetection::new(label, confidence, BoundingBox::new(1.0, 2.0, 3.0, 4.0))
    }

    #[test]
    fn drops_low_confidence_and_disallowed_classes() {
        let detector = Fixed(vec![
            raw("person", 0.9),
            raw("person", 0.29),
            raw("person", 0.3),
            raw("toothbrush", 0.95),
            raw("dog", 0.5),
        ]);
        let result = DetectionAdapter::default().detect_frame(&detector, &frame(8, 8));
        let labels: Vec<_> = result
            .detections()
            .iter()
            .map(|d| (d.class_label.as_str(), d.confidence))
            .collect();
        assert_eq!(labels, vec![("person", 0.9), ("person", 0.3), ("dog", 0.5)]);
        assert_eq!(result.frame_index, 3);
    }

    #[test]
    fn unrestricted_filter_keeps_every_class() {
        let adapter = DetectionAdapter::new(AdapterConfig {
            class_filter: ClassFilter::Unrestricted,
            ..AdapterConfig::default()
        });
        let detector = Fixed(vec![raw("toothbrush", 0.95)]);
        let result = adapter.detect_frame(&detector, &frame(8, 8));
        assert_eq!(result.detections().len(), 1);
    }

    #[test]
    fn detector_failure_degrades_to_empty() {
        let result = DetectionAdapter::default().detect_frame(&Broken, &frame(8, 8));
        assert!(result.is_failed());
        assert!(result.detections().is_empty());
        assert!(result.into_detections().is_empty());
    }

    #[test]
    fn oversize_frames_are_downscaled_and_boxes_mapped_back() {
        let recorder = SizeRecorder::default();
        let result = DetectionAdapter::default().detect_frame(&recorder, &frame(3840, 1600));

        assert_eq!(recorder.0.lock().unwrap().as_slice(), &[(1920, 800)]);
        let bbox = result.detections()[0].bounding_box;
        assert!((bbox.x2 - 3840.0).abs() < 1.0);
        assert!((bbox.y2 - 1600.0).abs() < 1.0);
    }

    #[test]
    fn boxes_map_back_per_axis_when_rounding_differs() {
        let recorder = SizeRecorder::default();
        let result = DetectionAdapter::default().detect_frame(&recorder, &frame(1921, 3));

        // 3 * (1920 / 1921) truncates to 2 rows while the width stays near 1920
        assert_eq!(recorder.0.lock().unwrap()[0].1, 2);
        let bbox = result.detections()[0].bounding_box;
        assert!((bbox.x2 - 1921.0).abs() < 1e-3, "{:?}", bbox);
        assert!((bbox.y2 - 3.0).abs() < 1e-3, "{:?}", bbox);
    }

    #[test]
    fn small_frames_are_passed_through() {
        let recorder = SizeRecorder::default();
        DetectionAdapter::default().detect_frame(&recorder, &frame(640, 480));
        assert_eq!(recorder.0.lock().unwrap().as_slice(), &[(640, 480)]);
    }

    #[test]
    fn common_filter_contains_expected_classes() {
        let filter = ClassFilter::common();
        for label in ["person", "tv", "cell phone", "dining table"] {
            assert!(filter.allows(label), "{}", label);
        }
        assert!(!filter.allows("giraffe"));
    }
}
