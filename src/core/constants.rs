//! Constants used throughout the classification pipeline.

/// Default model input size as (height, width), used when neither an override nor
/// shape discovery provides one.
pub const DEFAULT_INPUT_SIZE: (u32, u32) = (224, 224);

/// Scale applied to 8-bit pixel values before normalization.
pub const DEFAULT_NORMALIZATION_SCALE: f32 = 1.0 / 255.0;

/// ImageNet per-channel mean (RGB order).
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// ImageNet per-channel standard deviation (RGB order).
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Placeholder labels used when no label list or label file is available.
pub const DEFAULT_LABELS: [&str; 3] = ["classA", "classB", "classC"];

/// Name of the label file looked up beside the model and in the model directory.
pub const LABEL_FILE_NAME: &str = "labels.txt";

/// Default directory searched for model artifacts.
pub const DEFAULT_MODEL_DIR: &str = "models";

/// Conventional artifact names, checked in this order inside the model directory.
pub const CONVENTIONAL_MODEL_NAMES: [&str; 8] = [
    "model.onnx",
    "your_model.onnx",
    "best.onnx",
    "model.pt",
    "best.pt",
    "model.pth",
    "model.h5",
    "saved_model",
];

/// Number of labels shown in the health report before truncating with "...".
pub const HEALTH_LABEL_PREVIEW: usize = 5;

/// Lower bound of the stub classifier's synthesized confidence.
pub const STUB_MIN_CONFIDENCE: f32 = 0.01;

/// Upper bound of the stub classifier's synthesized confidence.
pub const STUB_MAX_CONFIDENCE: f32 = 0.99;
