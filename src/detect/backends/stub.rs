use anyhow::Result;
use image::RgbImage;

use crate::detect::backend::ObjectDetector;
use crate::detect::result::{BoundingBox, RawDetection};

/// Stub backend for testing and demos.
///
/// Reports the same fixed set of objects on every frame, with boxes expressed
/// as fractions of the frame size so they scale with the input.
pub struct StubBackend {
    objects: Vec<(String, f32, BoundingBox)>,
}

impl StubBackend {
    /// A scene with one person in front of a TV.
    pub fn new() -> Self {
        Self::with_objects(vec![
            ("person", 0.82, BoundingBox::new(0.10, 0.20, 0.40, 0.95)),
            ("tv", 0.74, BoundingBox::new(0.55, 0.15, 0.90, 0.55)),
        ])
    }

    /// Report `objects` (label, confidence, box in 0..1 frame fractions) on every frame.
    pub fn with_objects<S: Into<String>>(objects: Vec<(S, f32, BoundingBox)>) -> Self {
        Self {
            objects: objects
                .into_iter()
                .map(|(label, confidence, bbox)| (label.into(), confidence, bbox))
                .collect(),
        }
    }
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectDetector for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&self, frame: &RgbImage) -> Result<Vec<RawDetection>> {
        let (w, h) = (frame.width() as f32, frame.height() as f32);
        Ok(self
            .objects
            .iter()
            .map(|(label, confidence, bbox)| {
                RawDetection::new(
                    label.clone(),
                    *confidence,
                    BoundingBox::new(bbox.x1 * w, bbox.y1 * h, bbox.x2 * w, bbox.y2 * h),
                )
            })
            .collect())
    }
}
