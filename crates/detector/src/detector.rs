use crate::{
    backend::{InferenceBackend, RawOutput},
    config::DetectorConfig,
    decode::{self, Detection},
    error::DetectError,
    labels,
    letterbox::{Frame, Letterbox, LetterboxParams},
    nms::NonMaxSuppressor,
};
use common::span;
use ndarray::{Array, IxDyn};

struct Loaded<B> {
    backend: B,
    letterbox: Letterbox,
    input_size: (u32, u32),
    model_path: String,
}

/// Single-image detection pipeline: letterbox, external inference,
/// decode, non-maximum suppression.
///
/// The stages are exposed individually so harnesses can time them;
/// `detect` composes all four. A call reads the thresholds once at entry,
/// so reconfiguring between calls is safe while reconfiguring during a
/// call on a shared instance is not.
pub struct Detector<B: InferenceBackend> {
    loaded: Option<Loaded<B>>,
    config: DetectorConfig,
}

impl<B: InferenceBackend> Detector<B> {
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            loaded: None,
            config,
        }
    }

    /// Wrap an already-constructed backend, e.g. one built with a
    /// non-default execution provider.
    pub fn with_backend(backend: B, model_path: &str, config: DetectorConfig) -> Self {
        let input_size = backend.input_size();
        Self {
            loaded: Some(Loaded {
                letterbox: Letterbox::new(input_size),
                backend,
                input_size,
                model_path: model_path.to_string(),
            }),
            config,
        }
    }

    /// Load the model at `path` and query its declared input size. The
    /// session is owned by this detector and released when it drops.
    pub fn load_model(&mut self, path: &str) -> Result<(), DetectError> {
        let backend = B::load_model(path)?;
        let input_size = backend.input_size();

        self.loaded = Some(Loaded {
            letterbox: Letterbox::new(input_size),
            backend,
            input_size,
            model_path: path.to_string(),
        });

        tracing::info!(
            path,
            width = input_size.0,
            height = input_size.1,
            "Detector ready"
        );
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.loaded.is_some()
    }

    /// Model input dimensions `(width, height)`, once loaded.
    pub fn input_size(&self) -> Option<(u32, u32)> {
        self.loaded.as_ref().map(|l| l.input_size)
    }

    pub fn confidence_threshold(&self) -> f32 {
        self.config.confidence_threshold
    }

    pub fn set_confidence_threshold(&mut self, threshold: f32) {
        self.config.confidence_threshold = threshold;
    }

    pub fn nms_threshold(&self) -> f32 {
        self.config.nms_threshold
    }

    pub fn set_nms_threshold(&mut self, threshold: f32) {
        self.config.nms_threshold = threshold;
    }

    /// Letterbox `frame` into the model input tensor.
    pub fn preprocess(
        &mut self,
        frame: &Frame,
    ) -> Result<(Array<f32, IxDyn>, LetterboxParams), DetectError> {
        let loaded = self.loaded.as_mut().ok_or(DetectError::NotReady)?;
        let _s = span!("preprocess");
        loaded.letterbox.forward(frame)
    }

    /// Run the external inference engine on a preprocessed tensor.
    pub fn infer(&mut self, input: &Array<f32, IxDyn>) -> Result<RawOutput, DetectError> {
        let loaded = self.loaded.as_mut().ok_or(DetectError::NotReady)?;
        let _s = span!("infer");
        Ok(loaded.backend.infer(input)?)
    }

    /// Decode the raw output into original-image candidates and suppress
    /// redundant boxes.
    pub fn postprocess(
        &self,
        raw: &RawOutput,
        params: &LetterboxParams,
        orig_width: u32,
        orig_height: u32,
    ) -> Result<Vec<Detection>, DetectError> {
        if self.loaded.is_none() {
            return Err(DetectError::NotReady);
        }
        let _s = span!("postprocess");

        // The backend-declared shape must agree with the configured class
        // count; a wider or narrower row stride would misalign every row.
        let expected = raw.num_candidates * (decode::BOX_FIELDS + self.config.num_classes);
        if raw.num_classes != self.config.num_classes || raw.data.len() != expected {
            return Err(DetectError::CorruptOutput {
                expected,
                actual: raw.data.len(),
            });
        }

        let candidates = decode::decode(
            &raw.data,
            raw.num_candidates,
            self.config.num_classes,
            params,
            orig_width,
            orig_height,
            self.config.confidence_threshold,
        )?;

        let suppressor = NonMaxSuppressor::new(self.config.nms_threshold, self.config.nms_policy);
        Ok(suppressor.suppress(candidates))
    }

    /// Full pipeline over one frame.
    pub fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, DetectError> {
        let _s = span!("detect");

        let (input, params) = self.preprocess(frame)?;
        let raw = self.infer(&input)?;
        let detections = self.postprocess(&raw, &params, frame.width, frame.height)?;

        tracing::debug!(detections = detections.len(), "Frame processed");
        Ok(detections)
    }

    /// Human-readable summary of the loaded model and thresholds.
    pub fn model_info(&self) -> String {
        match &self.loaded {
            Some(loaded) => format!(
                "model: {} | input: {}x{} | confidence threshold: {} | nms threshold: {}",
                loaded.model_path,
                loaded.input_size.0,
                loaded.input_size.1,
                self.config.confidence_threshold,
                self.config.nms_threshold
            ),
            None => "model not loaded".to_string(),
        }
    }

    pub fn class_name(&self, class_id: usize) -> &'static str {
        labels::class_name(class_id)
    }
}
