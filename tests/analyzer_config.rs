use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use tempfile::{Builder, NamedTempFile};

use video_activity::config::AnalyzerSettings;
use video_activity::{ActivityTier, AnalysisConfig, ClassFilter, SamplingPolicy};

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "VIDEO_ACTIVITY_CONFIG",
        "VIDEO_ACTIVITY_MAX_FRAMES",
        "VIDEO_ACTIVITY_CONFIDENCE",
        "VIDEO_ACTIVITY_ALLOWED_CLASSES",
        "VIDEO_ACTIVITY_SAMPLING",
        "VIDEO_ACTIVITY_ACTIVITY_TIER",
        "VIDEO_ACTIVITY_BACKEND",
        "VIDEO_ACTIVITY_MODEL",
        "VIDEO_ACTIVITY_WORKERS",
    ] {
        std::env::remove_var(key);
    }
}

fn write_config(suffix: &str, body: &str) -> NamedTempFile {
    let mut file = Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("temp config");
    file.write_all(body.as_bytes()).expect("write config");
    file
}

#[test]
fn defaults_match_analysis_config_defaults() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = AnalyzerSettings::load().expect("load defaults");

    assert_eq!(cfg.analysis_config(), AnalysisConfig::default());
    assert_eq!(cfg.sampling.max_frames, 15);
    assert_eq!(cfg.detection.model_path, PathBuf::from("yolov8n.onnx"));
}

#[test]
fn loads_json_config_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = write_config(
        ".json",
        r#"{
            "sampling": {
                "max_frames": 30,
                "policy": "uniform",
                "min_brightness": 10.0
            },
            "detection": {
                "backend": "stub",
                "confidence_threshold": 0.45,
                "allowed_classes": ["person", "dog"],
                "workers": 2
            },
            "activity": {
                "tier": "minimal",
                "top_classes": 3
            }
        }"#,
    );

    std::env::set_var("VIDEO_ACTIVITY_CONFIG", file.path());
    std::env::set_var("VIDEO_ACTIVITY_MAX_FRAMES", "8");
    std::env::set_var("VIDEO_ACTIVITY_MODEL", "/models/custom.onnx");

    let cfg = AnalyzerSettings::load().expect("load config");

    assert_eq!(cfg.sampling.max_frames, 8);
    assert_eq!(cfg.sampling.policy, SamplingPolicy::Uniform);
    assert_eq!(cfg.sampling.min_brightness, 10.0);
    assert_eq!(cfg.sampling.max_brightness, 235.0);
    assert_eq!(cfg.detection.backend, "stub");
    assert_eq!(cfg.detection.model_path, PathBuf::from("/models/custom.onnx"));
    assert_eq!(cfg.detection.confidence_threshold, 0.45);
    assert_eq!(cfg.detection.workers, 2);
    assert_eq!(cfg.activity.tier, ActivityTier::Minimal);
    assert_eq!(cfg.activity.top_classes, 3);

    let analysis = cfg.analysis_config();
    assert_eq!(analysis.sampling.max_frames, 8);
    assert_eq!(analysis.detection.class_filter, ClassFilter::only(["person", "dog"]));
    assert_eq!(analysis.detection_workers, 2);

    clear_env();
}

#[test]
fn loads_toml_config() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = write_config(
        ".toml",
        r#"
[sampling]
brightness_filter = false

[detection]
allowed_classes = ["*"]
max_width = 1280
max_height = 720
"#,
    );

    let cfg = AnalyzerSettings::load_from(Some(file.path())).expect("load toml");
    let analysis = cfg.analysis_config();

    assert!(analysis.sampling.brightness.is_none());
    assert_eq!(analysis.detection.class_filter, ClassFilter::Unrestricted);
    assert_eq!(analysis.detection.max_dimensions, Some((1280, 720)));
}

#[test]
fn file_class_labels_are_trimmed() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = write_config(
        ".json",
        r#"{"detection": {"allowed_classes": [" person", "cell phone ", "  "]}}"#,
    );
    let cfg = AnalyzerSettings::load_from(Some(file.path())).expect("load config");

    assert_eq!(
        cfg.detection.allowed_classes,
        Some(vec!["person".to_string(), "cell phone".to_string()])
    );
    let filter = cfg.analysis_config().detection.class_filter;
    assert!(filter.allows("person"));
    assert!(filter.allows("cell phone"));

    let file = write_config(".json", r#"{"detection": {"allowed_classes": [" * "]}}"#);
    let cfg = AnalyzerSettings::load_from(Some(file.path())).expect("load config");
    assert_eq!(cfg.detection.allowed_classes, None);
}

#[test]
fn env_overrides_enums_and_class_list() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("VIDEO_ACTIVITY_SAMPLING", "Uniform");
    std::env::set_var("VIDEO_ACTIVITY_ACTIVITY_TIER", "minimal");
    std::env::set_var("VIDEO_ACTIVITY_ALLOWED_CLASSES", " car, truck ,,bus ");
    std::env::set_var("VIDEO_ACTIVITY_CONFIDENCE", "0.6");
    std::env::set_var("VIDEO_ACTIVITY_BACKEND", "stub");

    let cfg = AnalyzerSettings::load().expect("load config");

    assert_eq!(cfg.sampling.policy, SamplingPolicy::Uniform);
    assert_eq!(cfg.activity.tier, ActivityTier::Minimal);
    assert_eq!(
        cfg.detection.allowed_classes,
        Some(vec!["car".to_string(), "truck".to_string(), "bus".to_string()])
    );
    assert_eq!(cfg.detection.confidence_threshold, 0.6);
    assert_eq!(cfg.detection.backend, "stub");

    std::env::set_var("VIDEO_ACTIVITY_ALLOWED_CLASSES", "*");
    let cfg = AnalyzerSettings::load().expect("load config");
    assert_eq!(cfg.detection.allowed_classes, None);

    clear_env();
}

#[test]
fn rejects_out_of_range_values() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("VIDEO_ACTIVITY_MAX_FRAMES", "0");
    assert!(AnalyzerSettings::load().is_err());
    clear_env();

    std::env::set_var("VIDEO_ACTIVITY_CONFIDENCE", "1.5");
    assert!(AnalyzerSettings::load().is_err());
    clear_env();

    std::env::set_var("VIDEO_ACTIVITY_CONFIDENCE", "high");
    assert!(AnalyzerSettings::load().is_err());
    clear_env();

    std::env::set_var("VIDEO_ACTIVITY_SAMPLING", "random");
    assert!(AnalyzerSettings::load().is_err());
    clear_env();

    std::env::set_var("VIDEO_ACTIVITY_WORKERS", "0");
    assert!(AnalyzerSettings::load().is_err());
    clear_env();

    let file = write_config(
        ".json",
        r#"{"sampling": {"min_brightness": 200.0, "max_brightness": 100.0}}"#,
    );
    assert!(AnalyzerSettings::load_from(Some(file.path())).is_err());

    let file = write_config(".json", r#"{"activity": {"top_classes": 0}}"#);
    assert!(AnalyzerSettings::load_from(Some(file.path())).is_err());
}

#[test]
fn reports_unreadable_and_malformed_files() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let missing = PathBuf::from("/nonexistent/video_activity.toml");
    let err = AnalyzerSettings::load_from(Some(&missing)).unwrap_err();
    assert!(err.to_string().contains("failed to read config file"));

    let file = write_config(".json", "{ not json");
    let err = AnalyzerSettings::load_from(Some(file.path())).unwrap_err();
    assert!(err.to_string().contains("invalid config file"));
}
