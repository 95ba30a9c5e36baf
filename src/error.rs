//! Terminal failure conditions for a single analysis run.
//!
//! Isolated frame-decode and per-frame detector failures are recovered where
//! they happen and never reach this type. Everything here ends the request and
//! must be reported to the caller as-is.

use thiserror::Error;

/// Errors that end an analysis run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("video has no frames")]
    EmptySource,

    #[error("no usable frames could be extracted from video")]
    NoUsableFrames,

    #[error("no objects detected in the video")]
    NoDetections,

    #[error("detector unavailable: {0}")]
    DetectorUnavailable(String),
}

/// Coarse grouping the caller can act on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureCategory {
    /// The input video is unusable.
    BadInput,
    /// The video was analyzed but nothing matched.
    NothingFound,
    /// The system is not ready to serve requests.
    NotReady,
}

impl AnalysisError {
    pub fn detector_unavailable(message: impl Into<String>) -> Self {
        Self::DetectorUnavailable(message.into())
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptySource => "empty_source",
            Self::NoUsableFrames => "no_usable_frames",
            Self::NoDetections => "no_detections",
            Self::DetectorUnavailable(_) => "detector_unavailable",
        }
    }

    pub fn category(&self) -> FailureCategory {
        match self {
            Self::EmptySource | Self::NoUsableFrames => FailureCategory::BadInput,
            Self::NoDetections => FailureCategory::NothingFound,
            Self::DetectorUnavailable(_) => FailureCategory::NotReady,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_failure_has_a_distinct_code() {
        let errors = [
            AnalysisError::EmptySource,
            AnalysisError::NoUsableFrames,
            AnalysisError::NoDetections,
            AnalysisError::detector_unavailable("model not loaded"),
        ];
        let mut codes: Vec<_> = errors.iter().map(AnalysisError::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn categories_separate_input_from_readiness() {
        assert_eq!(
            AnalysisError::EmptySource.category(),
            FailureCategory::BadInput
        );
        assert_eq!(
            AnalysisError::NoDetections.category(),
            FailureCategory::NothingFound
        );
        assert_eq!(
            AnalysisError::detector_unavailable("x").category(),
            FailureCategory::NotReady
        );
        assert_eq!(
            AnalysisError::detector_unavailable("yolo").to_string(),
            "detector unavailable: yolo"
        );
    }
}
