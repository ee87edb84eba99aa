//! Gait kinematics runner: keypoints in, gait features and scores out.

use anyhow::{Context, Result};
use clap::Parser;
use gait_kinematics::config::Config;
use gait_kinematics::export;
use gait_kinematics::loader::FrameOrdering;
use gait_kinematics::pipeline::{InputLayout, Pipeline};
use gait_kinematics::scoring::GaitClassifier;
use log::info;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input root with `json/front` and `json/side`, or one `json` folder per clip
    path: PathBuf,

    /// Directory that receives the `final_score` file
    result_path: PathBuf,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<PathBuf>,

    /// Classifier model (overrides the configuration file)
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Frame ordering for per-clip folders (counter, lexicographic)
    #[arg(long)]
    frame_ordering: Option<String>,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    info!("Gait kinematics: {}", args.path.display());

    // Load configuration if provided
    let mut config = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {}", config_path.display());
        match Config::from_file(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::warn!("Failed to load config file: {}. Using defaults.", e);
                Config::default()
            }
        }
    } else {
        Config::default()
    };

    if let Some(ordering) = &args.frame_ordering {
        config.loader.frame_ordering = ordering.parse::<FrameOrdering>()?;
    }
    if let Some(model) = args.model {
        config.scoring.model_path = Some(model);
    }
    config.validate()?;

    let classifier = load_classifier(&config)?;
    let pipeline = Pipeline::new(config);

    let score = match InputLayout::detect(&args.path) {
        InputLayout::Pair => {
            info!("Processing front/side pair");
            let report = pipeline.run_pair(&args.path, classifier.as_deref())?;
            info!(
                "Front: {} of {} frames, side: {} of {} frames, {} fused rows",
                report.front.retained_frames,
                report.front.source_files,
                report.side.retained_frames,
                report.side.source_files,
                report.fused_rows
            );
            report.prediction.map(|prediction| prediction.score)
        }
        InputLayout::Batch => {
            info!("Frame ordering: {}", pipeline.config().loader.frame_ordering);
            let report = pipeline.run_batch(&args.path, classifier.as_deref())?;
            info!(
                "Processed {} clips, {} combined, {} failed, {} groups skipped",
                report.processed.len(),
                report.combined.len(),
                report.failed.len(),
                report.skipped_groups.len()
            );
            report.predictions.first().map(|prediction| prediction.score)
        }
    };

    if let Some(score) = score {
        std::fs::create_dir_all(&args.result_path)
            .with_context(|| format!("Failed to create {}", args.result_path.display()))?;
        let score_path = args.result_path.join("final_score");
        export::write_score(&score_path, score)?;
        info!("Wrote score {} to {}", score, score_path.display());
    }

    info!("Processing complete!");
    Ok(())
}

#[cfg(feature = "onnx")]
fn load_classifier(config: &Config) -> Result<Option<Box<dyn GaitClassifier>>> {
    use gait_kinematics::scoring::OnnxClassifier;

    let Some(model_path) = &config.scoring.model_path else {
        log::warn!("No classifier model configured, skipping scoring");
        return Ok(None);
    };
    let classifier = OnnxClassifier::new(model_path)
        .with_context(|| format!("Failed to load classifier {}", model_path.display()))?
        .with_expected_len(config.scoring.feature_length);
    Ok(Some(Box::new(classifier)))
}

#[cfg(not(feature = "onnx"))]
fn load_classifier(config: &Config) -> Result<Option<Box<dyn GaitClassifier>>> {
    if config.scoring.model_path.is_some() {
        anyhow::bail!("Built without the onnx feature, cannot load a classifier model");
    }
    Ok(None)
}
