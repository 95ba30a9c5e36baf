//! Video Activity Analyzer
//!
//! Samples a bounded set of frames from a video, runs an object detector on
//! each, aggregates per-class statistics and infers a short human-readable
//! description of the activity in the footage.
//!
//! # Architecture
//!
//! One analysis run is a straight pipeline:
//!
//! 1. **Sampling**: pick at most `max_frames` frame indices (banded or uniform),
//!    decode them, and drop frames that are too dark or too bright.
//! 2. **Detection**: run the detector capability on each kept frame, drop
//!    low-confidence and out-of-scope classes. A frame whose inference fails
//!    contributes nothing; the run continues.
//! 3. **Aggregation**: per-class count, mean confidence and share of total,
//!    ranked by count.
//! 4. **Inference**: rule tables over class co-occurrence produce the activity
//!    description.
//!
//! The detector is loaded once into a `BackendRegistry` and shared read-only.
//! Runs hold no state between calls.
//!
//! # Module Structure
//!
//! - `ingest`: video sources (files, synthetic `stub://` files, memory)
//! - `frame`: sampled frames and the brightness window
//! - `sampling`: frame index planning and sampling
//! - `detect`: detector capability, backends and registry
//! - `adapter`: per-frame detection with thresholding and class filtering
//! - `aggregate`: per-class statistics
//! - `activity`: activity rule tiers
//! - `pipeline`: the `Analyzer` entry point
//! - `report`: client-facing JSON shapes
//! - `config`: layered settings (defaults, file, environment)

pub mod activity;
pub mod adapter;
pub mod aggregate;
pub mod config;
pub mod detect;
pub mod error;
pub mod frame;
pub mod ingest;
pub mod pipeline;
pub mod report;
pub mod sampling;

pub use activity::{ActivityInferencer, ActivityTier};
pub use adapter::{AdapterConfig, ClassFilter, DetectionAdapter, FrameDetections, FrameOutcome};
pub use aggregate::{aggregate, top_classes, ClassStat};
pub use config::AnalyzerSettings;
pub use detect::{BackendRegistry, BoundingBox, Detection, ObjectDetector, RawDetection, StubBackend};
pub use error::{AnalysisError, FailureCategory};
pub use frame::{BrightnessWindow, FrameSample};
pub use ingest::{FileSource, MemorySource, VideoSource};
pub use pipeline::{AnalysisConfig, AnalysisResult, Analyzer};
pub use report::{AnalysisReport, ErrorReport};
pub use sampling::{plan_indices, FrameSampler, SamplerConfig, SamplingPolicy};

#[cfg(feature = "backend-tract")]
pub use detect::TractBackend;
