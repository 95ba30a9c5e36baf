#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::imageops::{self, FilterType};
use image::RgbImage;
use tract_onnx::prelude::*;

use crate::detect::backend::ObjectDetector;
use crate::detect::coco::{coco_class_name, COCO_CLASSES};
use crate::detect::result::{BoundingBox, RawDetection};

/// Square input edge of the stock YOLOv8 export.
pub const YOLO_INPUT_SIZE: u32 = 640;

const DEFAULT_SCORE_THRESHOLD: f32 = 0.25;
const DEFAULT_IOU_THRESHOLD: f32 = 0.5;

type Plan = TypedRunnableModel<TypedModel>;

/// Tract-based YOLOv8 backend for ONNX inference.
///
/// Loads a local model file once; inference runs on the shared, immutable plan.
/// Expects the `[1, 4 + classes, boxes]` output layout with COCO class order.
pub struct TractBackend {
    model: Plan,
    input_size: u32,
    score_threshold: f32,
    iou_threshold: f32,
}

impl TractBackend {
    /// Load an ONNX model from disk and prepare it for inference.
    pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let model_path = model_path.as_ref();
        let size = YOLO_INPUT_SIZE as usize;
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, size, size)),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        log::info!("TractBackend: loaded {}", model_path.display());
        Ok(Self {
            model,
            input_size: YOLO_INPUT_SIZE,
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
        })
    }

    /// Override the minimum class score kept before suppression.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.score_threshold = threshold;
        self
    }

    fn build_input(&self, frame: &RgbImage) -> Tensor {
        let size = self.input_size;
        let resized = imageops::resize(frame, size, size, FilterType::Triangle);
        let size = size as usize;
        tract_ndarray::Array4::from_shape_fn((1, 3, size, size), |(_, channel, y, x)| {
            resized.get_pixel(x as u32, y as u32)[channel] as f32 / 255.0
        })
        .into_tensor()
    }

    fn decode(&self, output: &Tensor, scale_x: f32, scale_y: f32) -> Result<Vec<RawDetection>> {
        let view = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?;
        let shape = view.shape().to_vec();
        if shape.len() != 3 || shape[1] < 5 {
            return Err(anyhow!("unexpected YOLO output shape {:?}", shape));
        }
        let num_classes = (shape[1] - 4).min(COCO_CLASSES.len());
        let num_boxes = shape[2];

        let mut candidates = Vec::new();
        for i in 0..num_boxes {
            let mut best_score = 0.0f32;
            let mut best_class = 0usize;
            for class_id in 0..num_classes {
                let score = view[[0, 4 + class_id, i]];
                if score > best_score {
                    best_score = score;
                    best_class = class_id;
                }
            }
            if best_score < self.score_threshold {
                continue;
            }
            let bbox = BoundingBox::from_center(
                view[[0, 0, i]] * scale_x,
                view[[0, 1, i]] * scale_y,
                view[[0, 2, i]] * scale_x,
                view[[0, 3, i]] * scale_y,
            );
            candidates.push(RawDetection::new(
                coco_class_name(best_class),
                best_score,
                bbox,
            ));
        }

        Ok(non_max_suppression(candidates, self.iou_threshold))
    }
}

impl ObjectDetector for TractBackend {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn detect(&self, frame: &RgbImage) -> Result<Vec<RawDetection>> {
        if frame.width() == 0 || frame.height() == 0 {
            return Err(anyhow!("cannot run detection on an empty frame"));
        }
        let input = self.build_input(frame);
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let scale_x = frame.width() as f32 / self.input_size as f32;
        let scale_y = frame.height() as f32 / self.input_size as f32;
        self.decode(output, scale_x, scale_y)
    }

    fn warm_up(&self) -> Result<()> {
        self.detect(&RgbImage::new(self.input_size, self.input_size))
            .map(|_| ())
    }
}

/// Greedy per-class non-maximum suppression.
fn non_max_suppression(mut detections: Vec<RawDetection>, iou_threshold: f32) -> Vec<RawDetection> {
    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    let mut keep: Vec<RawDetection> = Vec::with_capacity(detections.len());
    for candidate in detections {
        let suppressed = keep.iter().any(|kept| {
            kept.class_label == candidate.class_label
                && kept.bounding_box.iou(&candidate.bounding_box) >= iou_threshold
        });
        if !suppressed {
            keep.push(candidate);
        }
    }
    keep
}
