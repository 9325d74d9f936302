use super::{InferenceBackend, RawOutput};
use anyhow::Context;
use ndarray::{Array, IxDyn};
use ort::{
    session::{Session, builder::GraphOptimizationLevel},
    value::TensorRef,
};

/// Tensor names fixed by the exported model graph.
const INPUT_NAME: &str = "images";
const OUTPUT_NAME: &str = "output0";

/// ONNX Runtime session wrapper. Not safe for concurrent invocation;
/// callers share it behind external synchronization or not at all.
pub struct OrtBackend {
    session: Session,
    input_size: (u32, u32),
}

/// Read the spatial dimensions of the model's first input, expected to be
/// a `[batch, channels, height, width]` tensor.
fn query_input_size(session: &Session) -> anyhow::Result<(u32, u32)> {
    let input = session.inputs.first().context("model has no inputs")?;

    let dims: Vec<i64> = input
        .input_type
        .tensor_dimensions()
        .context("model input is not a tensor")?
        .to_vec();

    anyhow::ensure!(
        dims.len() == 4,
        "expected a 4D input tensor, got {}D",
        dims.len()
    );

    let (height, width) = (dims[2], dims[3]);
    anyhow::ensure!(
        height > 0 && width > 0,
        "model declares dynamic or invalid spatial dims {}x{}",
        width,
        height
    );

    Ok((width as u32, height as u32))
}

impl InferenceBackend for OrtBackend {
    fn load_model(path: &str) -> anyhow::Result<Self> {
        // Initialize ORT environment (idempotent)
        let _ = ort::init().commit();

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?
            .commit_from_file(path)?;

        let input_size = query_input_size(&session)?;

        tracing::info!(
            path,
            width = input_size.0,
            height = input_size.1,
            "Model loaded"
        );

        Ok(Self {
            session,
            input_size,
        })
    }

    fn input_size(&self) -> (u32, u32) {
        self.input_size
    }

    fn infer(&mut self, images: &Array<f32, IxDyn>) -> anyhow::Result<RawOutput> {
        let outputs = self.session.run(ort::inputs![
            INPUT_NAME => TensorRef::from_array_view(images.view())?
        ])?;

        let output = outputs[OUTPUT_NAME].try_extract_array::<f32>()?;
        let shape = output.shape();
        anyhow::ensure!(
            shape.len() == 3 && shape[2] > 5,
            "unexpected output shape {:?}, want [1, candidates, 5 + classes]",
            shape
        );

        let num_candidates = shape[1];
        let num_classes = shape[2] - 5;
        let data: Vec<f32> = output.iter().copied().collect();

        Ok(RawOutput {
            data,
            num_candidates,
            num_classes,
        })
    }
}
