use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::activity::ActivityTier;
use crate::adapter::{
    AdapterConfig, ClassFilter, COMMON_CLASSES, DEFAULT_CONFIDENCE_THRESHOLD,
    DEFAULT_MAX_DIMENSIONS,
};
use crate::frame::{BrightnessWindow, DEFAULT_MAX_BRIGHTNESS, DEFAULT_MIN_BRIGHTNESS};
use crate::pipeline::{AnalysisConfig, DEFAULT_TOP_CLASSES};
use crate::sampling::{SamplerConfig, SamplingPolicy, DEFAULT_MAX_FRAMES};

const DEFAULT_BACKEND: &str = if cfg!(feature = "backend-tract") {
    "tract"
} else {
    "stub"
};
const DEFAULT_MODEL_PATH: &str = "yolov8n.onnx";
const UNRESTRICTED_MARKER: &str = "*";

#[derive(Debug, Deserialize, Default)]
struct AnalyzerConfigFile {
    sampling: Option<SamplingConfigFile>,
    detection: Option<DetectionConfigFile>,
    activity: Option<ActivityConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct SamplingConfigFile {
    max_frames: Option<usize>,
    policy: Option<SamplingPolicy>,
    brightness_filter: Option<bool>,
    min_brightness: Option<f32>,
    max_brightness: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectionConfigFile {
    backend: Option<String>,
    model_path: Option<PathBuf>,
    confidence_threshold: Option<f32>,
    allowed_classes: Option<Vec<String>>,
    max_width: Option<u32>,
    max_height: Option<u32>,
    workers: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
struct ActivityConfigFile {
    tier: Option<ActivityTier>,
    top_classes: Option<usize>,
}

/// Resolved analyzer settings: defaults, then config file, then environment.
#[derive(Debug, Clone)]
pub struct AnalyzerSettings {
    pub sampling: SamplingSettings,
    pub detection: DetectionSettings,
    pub activity: ActivitySettings,
}

#[derive(Debug, Clone)]
pub struct SamplingSettings {
    pub max_frames: usize,
    pub policy: SamplingPolicy,
    pub brightness_filter: bool,
    pub min_brightness: f32,
    pub max_brightness: f32,
}

#[derive(Debug, Clone)]
pub struct DetectionSettings {
    pub backend: String,
    pub model_path: PathBuf,
    pub confidence_threshold: f32,
    /// `None` keeps every class.
    pub allowed_classes: Option<Vec<String>>,
    pub max_width: u32,
    pub max_height: u32,
    pub workers: usize,
}

#[derive(Debug, Clone)]
pub struct ActivitySettings {
    pub tier: ActivityTier,
    pub top_classes: usize,
}

impl AnalyzerSettings {
    /// Load using the file named by `VIDEO_ACTIVITY_CONFIG`, if set.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("VIDEO_ACTIVITY_CONFIG")
            .ok()
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);
        Self::load_from(config_path.as_deref())
    }

    /// Load using an explicit config file (or none), then apply the environment.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self> {
        let file_cfg = match config_path {
            Some(path) => read_config_file(path)?,
            None => AnalyzerConfigFile::default(),
        };
        let mut cfg = Self::from_file(file_cfg);
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: AnalyzerConfigFile) -> Self {
        let sampling = file.sampling.unwrap_or_default();
        let detection = file.detection.unwrap_or_default();
        let activity = file.activity.unwrap_or_default();

        Self {
            sampling: SamplingSettings {
                max_frames: sampling.max_frames.unwrap_or(DEFAULT_MAX_FRAMES),
                policy: sampling.policy.unwrap_or_default(),
                brightness_filter: sampling.brightness_filter.unwrap_or(true),
                min_brightness: sampling.min_brightness.unwrap_or(DEFAULT_MIN_BRIGHTNESS),
                max_brightness: sampling.max_brightness.unwrap_or(DEFAULT_MAX_BRIGHTNESS),
            },
            detection: DetectionSettings {
                backend: detection
                    .backend
                    .unwrap_or_else(|| DEFAULT_BACKEND.to_string()),
                model_path: detection
                    .model_path
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH)),
                confidence_threshold: detection
                    .confidence_threshold
                    .unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD),
                allowed_classes: match detection.allowed_classes {
                    Some(classes) => parse_class_list(classes),
                    None => Some(COMMON_CLASSES.iter().map(|c| c.to_string()).collect()),
                },
                max_width: detection.max_width.unwrap_or(DEFAULT_MAX_DIMENSIONS.0),
                max_height: detection.max_height.unwrap_or(DEFAULT_MAX_DIMENSIONS.1),
                workers: detection.workers.unwrap_or(1),
            },
            activity: ActivitySettings {
                tier: activity.tier.unwrap_or_default(),
                top_classes: activity.top_classes.unwrap_or(DEFAULT_TOP_CLASSES),
            },
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(value) = std::env::var("VIDEO_ACTIVITY_MAX_FRAMES") {
            self.sampling.max_frames = value
                .trim()
                .parse()
                .map_err(|_| anyhow!("VIDEO_ACTIVITY_MAX_FRAMES must be a positive integer"))?;
        }
        if let Ok(value) = std::env::var("VIDEO_ACTIVITY_CONFIDENCE") {
            self.detection.confidence_threshold = value
                .trim()
                .parse()
                .map_err(|_| anyhow!("VIDEO_ACTIVITY_CONFIDENCE must be a number in [0, 1]"))?;
        }
        if let Ok(value) = std::env::var("VIDEO_ACTIVITY_ALLOWED_CLASSES") {
            let parsed = split_csv(&value);
            if !parsed.is_empty() {
                self.detection.allowed_classes = parse_class_list(parsed);
            }
        }
        if let Ok(value) = std::env::var("VIDEO_ACTIVITY_SAMPLING") {
            if !value.trim().is_empty() {
                self.sampling.policy = value.parse()?;
            }
        }
        if let Ok(value) = std::env::var("VIDEO_ACTIVITY_ACTIVITY_TIER") {
            if !value.trim().is_empty() {
                self.activity.tier = value.parse()?;
            }
        }
        if let Ok(value) = std::env::var("VIDEO_ACTIVITY_BACKEND") {
            if !value.trim().is_empty() {
                self.detection.backend = value.trim().to_string();
            }
        }
        if let Ok(value) = std::env::var("VIDEO_ACTIVITY_MODEL") {
            if !value.trim().is_empty() {
                self.detection.model_path = PathBuf::from(value);
            }
        }
        if let Ok(value) = std::env::var("VIDEO_ACTIVITY_WORKERS") {
            self.detection.workers = value
                .trim()
                .parse()
                .map_err(|_| anyhow!("VIDEO_ACTIVITY_WORKERS must be a positive integer"))?;
        }
        Ok(())
    }

    /// Check ranges. Called by the loaders; call again after manual edits.
    pub fn validate(&self) -> Result<()> {
        if self.sampling.max_frames == 0 {
            return Err(anyhow!("max_frames must be greater than zero"));
        }
        if self.sampling.min_brightness >= self.sampling.max_brightness {
            return Err(anyhow!(
                "min_brightness ({}) must be below max_brightness ({})",
                self.sampling.min_brightness,
                self.sampling.max_brightness
            ));
        }
        if !(0.0..=1.0).contains(&self.detection.confidence_threshold) {
            return Err(anyhow!(
                "confidence_threshold must be within [0, 1], got {}",
                self.detection.confidence_threshold
            ));
        }
        if self.detection.max_width == 0 || self.detection.max_height == 0 {
            return Err(anyhow!("max_width and max_height must be greater than zero"));
        }
        if self.detection.workers == 0 {
            return Err(anyhow!("workers must be greater than zero"));
        }
        if self.activity.top_classes == 0 {
            return Err(anyhow!("top_classes must be greater than zero"));
        }
        Ok(())
    }

    /// Pipeline configuration for these settings.
    pub fn analysis_config(&self) -> AnalysisConfig {
        AnalysisConfig {
            sampling: SamplerConfig {
                max_frames: self.sampling.max_frames,
                policy: self.sampling.policy,
                brightness: self.sampling.brightness_filter.then(|| {
                    BrightnessWindow::new(self.sampling.min_brightness, self.sampling.max_brightness)
                }),
            },
            detection: AdapterConfig {
                confidence_threshold: self.detection.confidence_threshold,
                class_filter: match &self.detection.allowed_classes {
                    Some(classes) => ClassFilter::only(classes.iter().cloned()),
                    None => ClassFilter::Unrestricted,
                },
                max_dimensions: Some((self.detection.max_width, self.detection.max_height)),
            },
            activity_tier: self.activity.tier,
            top_classes: self.activity.top_classes,
            detection_workers: self.detection.workers,
        }
    }
}

fn read_config_file(path: &Path) -> Result<AnalyzerConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let cfg = if is_toml {
        toml::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}

/// `["*"]` means unrestricted; anything else is an allow-list of trimmed labels.
fn parse_class_list(classes: Vec<String>) -> Option<Vec<String>> {
    let classes: Vec<String> = classes
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .map(|c| c.to_string())
        .collect();
    if classes.iter().any(|c| c == UNRESTRICTED_MARKER) {
        None
    } else {
        Some(classes)
    }
}

fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .map(|entry| entry.to_string())
        .collect()
}
