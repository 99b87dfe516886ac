//! Image Classification Example
//!
//! This example resolves a model the same way a service would at startup (environment
//! variables first, then command-line overrides), prints the health report and classifies
//! each image given on the command line.
//!
//! Usage:
//! ```
//! cargo run --example classify -- --model-dir models <image_paths>...
//! ```
//!
//! Without a model, add `--allow-stub` to get deterministic placeholder results:
//! ```
//! cargo run --example classify -- --allow-stub --labels benign,malignant <image_paths>...
//! ```

use clap::Parser;
use mediconnect_ml::core::config::{
    ConfigValidator, InputSize, PipelineConfig, parse_label_list,
};
use mediconnect_ml::core::init_tracing;
use mediconnect_ml::pipeline::Classifier;
use serde_json::json;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// Command-line arguments for the classification example
#[derive(Parser)]
#[command(name = "classify")]
#[command(about = "Image Classification Example - top-1 prediction for each image")]
struct Args {
    /// Directory searched for a model and labels.txt
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Explicit model file or directory
    #[arg(short, long)]
    model_path: Option<PathBuf>,

    /// Input size as "height,width"
    #[arg(long)]
    input_size: Option<InputSize>,

    /// Comma-separated class labels
    #[arg(long)]
    labels: Option<String>,

    /// Answer with the development stub when no model loads
    #[arg(long)]
    allow_stub: bool,

    /// Print results as JSON lines instead of log messages
    #[arg(long)]
    json: bool,

    /// Image file paths to process
    #[arg(required = true)]
    images: Vec<PathBuf>,
}

fn build_config(args: &Args) -> PipelineConfig {
    let mut config = PipelineConfig::from_env();
    if let Some(dir) = &args.model_dir {
        config = config.with_model_dir(dir);
    }
    if let Some(path) = &args.model_path {
        config = config.with_model_path(path);
    }
    if let Some(size) = args.input_size {
        config = config.with_input_size(size);
    }
    if let Some(labels) = &args.labels {
        config = config.with_labels(parse_label_list(labels));
    }
    if args.allow_stub {
        config = config.with_allow_stub(true);
    }
    config
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args = Args::parse();
    let config = build_config(&args);
    config.validate()?;

    let classifier = Classifier::from_config(&config);
    if let Some(failure) = classifier.load_failure() {
        warn!("Model could not be loaded: {}", failure);
    }

    let health = classifier.health();
    if args.json {
        println!("{}", serde_json::to_string(&health)?);
    } else {
        info!(
            "Model: {} | input {}x{} | labels {:?} | stub {}",
            health
                .model_kind
                .map(|k| k.to_string())
                .unwrap_or_else(|| "none".to_string()),
            health.input_size.0,
            health.input_size.1,
            health.labels,
            health.stub_enabled
        );
    }

    let mut failures = 0;
    for path in &args.images {
        match classifier.classify_path(path) {
            Ok(result) if args.json => {
                println!(
                    "{}",
                    json!({ "image": path.display().to_string(), "result": result })
                );
            }
            Ok(result) => {
                info!(
                    "{}: {} (confidence: {:.3})",
                    path.display(),
                    result.label,
                    result.confidence
                );
            }
            Err(e) => {
                failures += 1;
                error!("{}: {}", path.display(), e);
            }
        }
    }

    if failures == args.images.len() {
        return Err("no image could be classified".into());
    }
    Ok(())
}
