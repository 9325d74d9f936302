use crate::nms::NmsPolicy;
use std::env;

pub use common::Environment;

pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;
pub const DEFAULT_NMS_THRESHOLD: f32 = 0.4;

/// COCO vocabulary size; the class-score span of every raw output row.
pub const COCO_NUM_CLASSES: usize = 80;

#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub environment: Environment,
    pub model_path: String,
    pub confidence_threshold: f32,
    pub nms_threshold: f32,
    pub nms_policy: NmsPolicy,
    pub num_classes: usize,
}

impl DetectorConfig {
    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> anyhow::Result<Self> {
        let environment = Environment::from_env();

        let model_path =
            env::var("MODEL_PATH").unwrap_or_else(|_| "models/yolov5s.onnx".to_string());

        let confidence_threshold = env::var("CONFIDENCE_THRESHOLD")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD);

        let nms_threshold = env::var("NMS_THRESHOLD")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_NMS_THRESHOLD);

        let nms_policy = env::var("NMS_POLICY")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default();

        Ok(Self {
            environment,
            model_path,
            confidence_threshold,
            nms_threshold,
            nms_policy,
            num_classes: COCO_NUM_CLASSES,
        })
    }

    /// Create default configuration for testing
    #[cfg(test)]
    pub fn test_default() -> Self {
        Self {
            environment: Environment::Development,
            model_path: "/models/model.onnx".to_string(),
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            nms_threshold: DEFAULT_NMS_THRESHOLD,
            nms_policy: NmsPolicy::CrossClass,
            num_classes: COCO_NUM_CLASSES,
        }
    }
}
