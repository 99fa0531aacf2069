pub mod ctc;
pub mod engine;
pub mod hash;
pub mod pipeline;
pub mod preprocess;
pub mod recognizer;
pub mod types;

pub use ctc::{best_path, collapse_path, greedy_decode};
pub use engine::InferenceEngine;
#[cfg(feature = "onnx")]
pub use engine::onnx::OnnxEngine;
pub use hash::{sha256_bytes, to_hex, upload_extension, upload_path};
pub use pipeline::{PipelineError, PrescriptionOutcome, PrescriptionPipeline};
pub use preprocess::{Preprocessor, RawImage};
pub use recognizer::{MockRecognizer, OcrError, Recognizer, TextRecognizer};
pub use types::{InputGeometry, InputTensor, LogitsMatrix};
