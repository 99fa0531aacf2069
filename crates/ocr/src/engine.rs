use ndarray::ArrayD;

use crate::recognizer::OcrError;
use crate::types::{InputGeometry, InputTensor};

/// A loaded recognition model.
///
/// Implementations must be safe to share across threads; an engine whose
/// runtime needs exclusive access serializes `run` internally.
pub trait InferenceEngine: Send + Sync {
    /// The fixed image size the model's input declares.
    fn input_geometry(&self) -> InputGeometry;

    /// Width of the output's class axis, when the model declares it statically.
    fn output_classes(&self) -> Option<usize>;

    /// Run the model on a `(1, H, W, C)` batch and return its first output.
    fn run(&self, input: InputTensor) -> Result<ArrayD<f32>, OcrError>;
}

// ── ONNX Runtime engine (optional, gated behind `onnx` feature) ───────────────

#[cfg(feature = "onnx")]
pub mod onnx {
    use super::{InferenceEngine, InputGeometry, InputTensor, OcrError};
    use ndarray::ArrayD;
    use ort::session::{builder::GraphOptimizationLevel, Session};
    use ort::value::Tensor;
    use parking_lot::Mutex;
    use std::path::{Path, PathBuf};

    pub struct OnnxEngine {
        // `Session::run` needs `&mut`, so inference calls are serialized here.
        session: Mutex<Session>,
        input_name: String,
        output_name: String,
        geometry: InputGeometry,
        output_classes: Option<usize>,
        model_path: PathBuf,
    }

    impl OnnxEngine {
        pub fn load(model_path: &Path, intra_threads: usize) -> Result<Self, OcrError> {
            if !model_path.exists() {
                return Err(OcrError::ModelLoad(format!(
                    "model not found: {}",
                    model_path.display()
                )));
            }

            tracing::info!("Loading recognition model from {}", model_path.display());

            let session = Session::builder()
                .map_err(load_err)?
                .with_optimization_level(GraphOptimizationLevel::Level3)
                .map_err(load_err)?
                .with_intra_threads(intra_threads)
                .map_err(load_err)?
                .commit_from_file(model_path)
                .map_err(load_err)?;

            let input = session
                .inputs
                .first()
                .ok_or_else(|| OcrError::ModelLoad("model declares no inputs".to_string()))?;
            let dims: Vec<i64> = input
                .input_type
                .tensor_shape()
                .map(|shape| shape.iter().copied().collect())
                .ok_or_else(|| {
                    OcrError::Config(format!("model input '{}' is not a tensor", input.name))
                })?;
            let geometry = InputGeometry::from_nhwc_dims(&dims)?;
            let input_name = input.name.clone();

            let output = session
                .outputs
                .first()
                .ok_or_else(|| OcrError::ModelLoad("model declares no outputs".to_string()))?;
            let output_classes = output
                .output_type
                .tensor_shape()
                .and_then(|shape| shape.iter().last().copied())
                .and_then(|d| usize::try_from(d).ok())
                .filter(|&d| d > 0);
            let output_name = output.name.clone();

            tracing::info!(
                input = %input_name,
                output = %output_name,
                height = geometry.height,
                width = geometry.width,
                channels = geometry.channels,
                classes = ?output_classes,
                "recognition model loaded"
            );

            Ok(Self {
                session: Mutex::new(session),
                input_name,
                output_name,
                geometry,
                output_classes,
                model_path: model_path.to_path_buf(),
            })
        }

        pub fn model_path(&self) -> &Path {
            &self.model_path
        }
    }

    fn load_err(e: impl std::fmt::Display) -> OcrError {
        OcrError::ModelLoad(e.to_string())
    }

    impl InferenceEngine for OnnxEngine {
        fn input_geometry(&self) -> InputGeometry {
            self.geometry
        }

        fn output_classes(&self) -> Option<usize> {
            self.output_classes
        }

        fn run(&self, input: InputTensor) -> Result<ArrayD<f32>, OcrError> {
            let tensor = Tensor::from_array(input).map_err(|e| OcrError::Inference(e.to_string()))?;
            let mut session = self.session.lock();
            let outputs = session
                .run(ort::inputs![self.input_name.as_str() => tensor])
                .map_err(|e| OcrError::Inference(e.to_string()))?;
            let output = outputs.get(self.output_name.as_str()).ok_or_else(|| {
                OcrError::Inference(format!("model output '{}' missing", self.output_name))
            })?;
            let array = output
                .try_extract_array::<f32>()
                .map_err(|e| OcrError::Inference(e.to_string()))?;
            Ok(array.into_owned())
        }
    }
}
