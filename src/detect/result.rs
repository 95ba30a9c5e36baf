use serde::{Deserialize, Serialize};

/// Axis-aligned box in pixel coordinates, corners `(x1, y1)` and `(x2, y2)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Box from center coordinates and size.
    pub fn from_center(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self {
            x1: cx - w / 2.0,
            y1: cy - h / 2.0,
            x2: cx + w / 2.0,
            y2: cy + h / 2.0,
        }
    }

    pub fn area(&self) -> f32 {
        (self.x2 - self.x1).max(0.0) * (self.y2 - self.y1).max(0.0)
    }

    /// Intersection over union with another box.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let ix = (self.x2.min(other.x2) - self.x1.max(other.x1)).max(0.0);
        let iy = (self.y2.min(other.y2) - self.y1.max(other.y1)).max(0.0);
        let intersection = ix * iy;
        let union = self.area() + other.area() - intersection;
        if union > 0.0 {
            intersection / union
        } else {
            0.0
        }
    }

    /// Multiply x coordinates by `fx` and y coordinates by `fy`.
    pub fn scaled_xy(&self, fx: f32, fy: f32) -> Self {
        Self {
            x1: self.x1 * fx,
            y1: self.y1 * fy,
            x2: self.x2 * fx,
            y2: self.y2 * fy,
        }
    }
}

/// One observation as reported by a detector backend.
///
/// Coordinates are relative to the image the backend was given.
#[derive(Clone, Debug, PartialEq)]
pub struct RawDetection {
    pub class_label: String,
    pub confidence: f32,
    pub bounding_box: BoundingBox,
}

impl RawDetection {
    pub fn new(class_label: impl Into<String>, confidence: f32, bounding_box: BoundingBox) -> Self {
        Self {
            class_label: class_label.into(),
            confidence,
            bounding_box,
        }
    }
}

/// A retained detection in source-frame pixel coordinates.
///
/// Only the detection adapter produces these, after thresholding and class filtering.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(rename = "class")]
    pub class_label: String,
    pub confidence: f32,
    #[serde(rename = "bbox")]
    pub bounding_box: BoundingBox,
}

impl Detection {
    pub fn new(class_label: impl Into<String>, confidence: f32, bounding_box: BoundingBox) -> Self {
        Self {
            class_label: class_label.into(),
            confidence,
            bounding_box,
        }
    }
}
