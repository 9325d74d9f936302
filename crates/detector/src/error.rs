use thiserror::Error;

/// Failures of the detection pipeline. Malformed external data aborts the
/// current call; an absence of detections is never an error.
#[derive(Debug, Error)]
pub enum DetectError {
    /// The caller supplied an image the pipeline cannot map into model space.
    #[error("invalid input image: {reason}")]
    InvalidInput { reason: String },

    /// `detect` (or any stage) was called before a model was loaded.
    #[error("model is not loaded")]
    NotReady,

    /// The raw output buffer disagrees with its declared shape. No
    /// partial detections are returned.
    #[error("corrupt raw output: declared shape requires {expected} values, buffer has {actual}")]
    CorruptOutput { expected: usize, actual: usize },

    /// The inference collaborator failed.
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}
