use ndarray::{Array, IxDyn};

#[cfg(feature = "ort-backend")]
pub mod ort;

/// Seam to the external inference engine.
///
/// An implementation owns its model session for its whole lifetime; the
/// session is released when the backend is dropped. Whether concurrent
/// invocation is safe is the implementation's documented concern.
pub trait InferenceBackend {
    fn load_model(path: &str) -> anyhow::Result<Self>
    where
        Self: Sized;

    /// Spatial input dimensions `(width, height)` declared by the model,
    /// queried once at setup.
    fn input_size(&self) -> (u32, u32);

    /// Run inference on a `[1, 3, H, W]` tensor.
    fn infer(&mut self, images: &Array<f32, IxDyn>) -> anyhow::Result<RawOutput>;
}

/// Flat raw output plus its logical `[num_candidates, 5 + num_classes]`
/// shape. Values are widened to f32 at the extraction boundary whatever
/// the model's storage precision.
pub struct RawOutput {
    pub data: Vec<f32>,
    pub num_candidates: usize,
    pub num_classes: usize,
}
