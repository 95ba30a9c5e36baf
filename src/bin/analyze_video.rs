//! analyze_video - sample a video, detect objects and describe the activity
//!
//! Prints an `AnalysisReport` as JSON on success. On an analysis failure prints
//! an `ErrorReport` and exits with a category-specific status.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use video_activity::config::AnalyzerSettings;
use video_activity::{
    ActivityTier, AnalysisError, AnalysisReport, Analyzer, BackendRegistry, ErrorReport,
    FailureCategory, FileSource, SamplingPolicy, StubBackend,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Local video file (.mp4 .avi .mov .mkv .wmv) or stub://name?frames=N.
    #[arg(required_unless_present = "list_backends")]
    path: Option<String>,
    /// Config file (.toml or .json).
    #[arg(long, env = "VIDEO_ACTIVITY_CONFIG")]
    config: Option<PathBuf>,
    /// Maximum number of frames to sample.
    #[arg(long)]
    max_frames: Option<usize>,
    /// Minimum detection confidence in [0, 1].
    #[arg(long)]
    confidence: Option<f32>,
    /// Detector backend name.
    #[arg(long)]
    backend: Option<String>,
    /// ONNX model path for the tract backend.
    #[arg(long)]
    model: Option<PathBuf>,
    /// Sampling policy: banded or uniform.
    #[arg(long)]
    sampling: Option<SamplingPolicy>,
    /// Keep frames regardless of brightness.
    #[arg(long)]
    no_brightness_filter: bool,
    /// Activity rule tier: extended or minimal.
    #[arg(long)]
    tier: Option<ActivityTier>,
    /// Number of ranked classes in the report.
    #[arg(long)]
    top: Option<usize>,
    /// Worker threads for per-frame detection.
    #[arg(long)]
    workers: Option<usize>,
    /// List loadable backends and exit.
    #[arg(long)]
    list_backends: bool,
}

fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut settings = AnalyzerSettings::load_from(args.config.as_deref())?;
    apply_args(&mut settings, &args);
    settings.validate().context("invalid settings")?;

    let registry = build_registry(&settings);
    if args.list_backends {
        for name in registry.list() {
            println!("{}", name);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let path = args
        .path
        .as_deref()
        .context("a video path is required")?;

    let config = settings.analysis_config();
    let top_n = config.top_classes;
    let analyzer = match Analyzer::from_registry(&registry, Some(&settings.detection.backend), config)
    {
        Ok(analyzer) => analyzer,
        Err(err) => return report_failure(&err),
    };
    let mut source = FileSource::open(path)?;
    log::info!(
        "analyze_video: backend={} path={}",
        analyzer.detector_name(),
        source.path()
    );
    match analyzer.run(&mut source) {
        Ok(result) => {
            let report = AnalysisReport::from_result(&result, top_n);
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report_failure(&err),
    }
}

fn apply_args(settings: &mut AnalyzerSettings, args: &Args) {
    if let Some(max_frames) = args.max_frames {
        settings.sampling.max_frames = max_frames;
    }
    if let Some(policy) = args.sampling {
        settings.sampling.policy = policy;
    }
    if args.no_brightness_filter {
        settings.sampling.brightness_filter = false;
    }
    if let Some(confidence) = args.confidence {
        settings.detection.confidence_threshold = confidence;
    }
    if let Some(backend) = &args.backend {
        settings.detection.backend = backend.clone();
    }
    if let Some(model) = &args.model {
        settings.detection.model_path = model.clone();
    }
    if let Some(workers) = args.workers {
        settings.detection.workers = workers;
    }
    if let Some(tier) = args.tier {
        settings.activity.tier = tier;
    }
    if let Some(top) = args.top {
        settings.activity.top_classes = top;
    }
}

fn build_registry(settings: &AnalyzerSettings) -> BackendRegistry {
    let mut registry = BackendRegistry::new();
    registry.register(StubBackend::new());

    #[cfg(feature = "backend-tract")]
    {
        use video_activity::ObjectDetector;

        let loaded = video_activity::TractBackend::new(&settings.detection.model_path)
            .map(|backend| backend.with_threshold(settings.detection.confidence_threshold));
        match loaded {
            Ok(backend) => match backend.warm_up() {
                Ok(()) => registry.register(backend),
                Err(err) => log::warn!("analyze_video: tract warm-up failed: {:#}", err),
            },
            Err(err) => log::warn!(
                "analyze_video: failed to load model {}: {:#}",
                settings.detection.model_path.display(),
                err
            ),
        }
    }
    #[cfg(not(feature = "backend-tract"))]
    let _ = settings;

    registry
}

fn report_failure(err: &AnalysisError) -> Result<ExitCode> {
    log::warn!("analyze_video: {}", err);
    println!("{}", serde_json::to_string_pretty(&ErrorReport::from(err))?);
    let status = match err.category() {
        FailureCategory::BadInput => 2,
        FailureCategory::NothingFound => 3,
        FailureCategory::NotReady => 4,
    };
    Ok(ExitCode::from(status))
}
