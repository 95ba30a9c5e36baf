//! Client-facing serialization of an analysis result.
//!
//! Field names match what existing clients consume:
//!
//! ```json
//! {
//!   "detections": [{"class": "person", "count": 3, "confidence": 0.6, "total_detections": 4}],
//!   "activity": "Person watching TV",
//!   "frames_processed": 10,
//!   "total_objects_detected": 4
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::aggregate::top_classes;
use crate::error::AnalysisError;
use crate::pipeline::AnalysisResult;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassReport {
    #[serde(rename = "class")]
    pub class_label: String,
    pub count: usize,
    /// Mean confidence for the class.
    pub confidence: f32,
    pub total_detections: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub detections: Vec<ClassReport>,
    pub activity: String,
    pub frames_processed: usize,
    pub total_objects_detected: usize,
}

impl AnalysisReport {
    /// Report exposing the `top_n` most frequent classes.
    pub fn from_result(result: &AnalysisResult, top_n: usize) -> Self {
        let detections = top_classes(&result.ranked_stats, top_n)
            .iter()
            .map(|stat| ClassReport {
                class_label: stat.class_label.clone(),
                count: stat.occurrence_count,
                confidence: stat.mean_confidence,
                total_detections: result.total_detections,
            })
            .collect();
        Self {
            detections,
            activity: result.activity_description.clone(),
            frames_processed: result.frames_processed,
            total_objects_detected: result.total_detections,
        }
    }
}

/// Error body for a failed run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub code: String,
    pub detail: String,
}

impl From<&AnalysisError> for ErrorReport {
    fn from(error: &AnalysisError) -> Self {
        Self {
            code: error.code().to_string(),
            detail: error.to_string(),
        }
    }
}
