//! Classification through ONNX Runtime with small graphs that average each input channel.
//!
//! `channel_mean_64.onnx` declares its input as `[1, 3, 64, 64]`;
//! `channel_mean_dynamic.onnx` declares `[batch, 3, height, width]`. Both output `[1, 3]`.

#![cfg(feature = "onnx")]

use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use mediconnect_ml::core::config::{InputSize, PipelineConfig};
use mediconnect_ml::core::constants::{IMAGENET_MEAN, IMAGENET_STD};
use mediconnect_ml::domain::{InputLayout, ModelKind};
use mediconnect_ml::pipeline::{Classifier, PipelineState, RuntimeHandle};
use mediconnect_ml::prelude::InferenceError;
use mediconnect_ml::processors::softmax;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const LABELS: [&str; 3] = ["red", "green", "blue"];

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn handle(classifier: &Classifier) -> &RuntimeHandle {
    match classifier.state() {
        PipelineState::Loaded(handle) => handle,
        other => panic!("expected a loaded model, got {other:?}"),
    }
}

fn solid_red() -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(80, 50, Rgb([255, 0, 0])))
}

#[test]
fn test_fixed_shape_model_is_discovered_and_runs() {
    let dir = TempDir::new().unwrap();
    fs::copy(fixture("channel_mean_64.onnx"), dir.path().join("model.onnx")).unwrap();

    let config = PipelineConfig::new()
        .with_model_dir(dir.path())
        .with_labels(LABELS);
    let classifier = Classifier::from_config(&config);

    assert!(classifier.load_failure().is_none());
    let handle = handle(&classifier);
    assert_eq!(handle.kind(), ModelKind::GraphExecution);
    assert_eq!(handle.layout(), InputLayout::ChannelFirst);
    assert_eq!(classifier.input_size(), InputSize::new(64, 64));
    assert_eq!(classifier.health().input_size, (64, 64));

    let result = classifier.classify(&solid_red()).unwrap();
    assert_eq!(result.label, "red");

    let probs = result.details.probabilities().unwrap();
    assert_eq!(probs.len(), 3);
    assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-5);

    // the graph returns the normalized channel values of a solid image
    let channel_means: Vec<f32> = [1.0, 0.0, 0.0]
        .iter()
        .zip(IMAGENET_MEAN.iter().zip(IMAGENET_STD.iter()))
        .map(|(v, (mean, std))| (v - mean) / std)
        .collect();
    let expected = softmax(&channel_means);
    for (got, want) in probs.iter().zip(&expected) {
        assert!((got - want).abs() < 1e-4, "{probs:?} vs {expected:?}");
    }
    assert!((result.confidence - expected[0]).abs() < 1e-4);
}

#[test]
fn test_size_override_beats_declared_shape() {
    let dir = TempDir::new().unwrap();
    let config = PipelineConfig::new()
        .with_model_dir(dir.path())
        .with_model_path(fixture("channel_mean_64.onnx"))
        .with_input_size(InputSize::new(32, 32));
    let classifier = Classifier::from_config(&config);

    assert_eq!(handle(&classifier).layout(), InputLayout::ChannelFirst);
    assert_eq!(classifier.input_size(), InputSize::new(32, 32));

    // ONNX Runtime rejects a 32x32 batch for a graph fixed at 64x64
    let err = classifier.classify(&solid_red()).unwrap_err();
    assert!(matches!(err, InferenceError::InferenceFailed { .. }));
}

#[test]
fn test_dynamic_model_uses_default_or_override() {
    let dir = TempDir::new().unwrap();
    let model = fixture("channel_mean_dynamic.onnx");

    let config = PipelineConfig::new()
        .with_model_dir(dir.path())
        .with_model_path(&model)
        .with_labels(LABELS);
    let classifier = Classifier::from_config(&config);
    assert_eq!(handle(&classifier).layout(), InputLayout::ChannelFirst);
    assert_eq!(classifier.input_size(), InputSize::new(224, 224));

    let classifier = Classifier::from_config(&config.with_input_size(InputSize::new(32, 48)));
    assert_eq!(classifier.input_size(), InputSize::new(32, 48));

    let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(20, 20, Luma([128])));
    let result = classifier.classify(&gray).unwrap();
    // mid gray normalizes highest on the channel with the lowest ImageNet mean
    assert_eq!(result.label, "blue");
    assert_eq!(result.details.probabilities().map(<[f32]>::len), Some(3));
}
