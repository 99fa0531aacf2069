use ndarray::{Array2, Array4, ArrayD, Ix2, Ix3};

use crate::recognizer::OcrError;

/// Batch of one image, laid out `(1, height, width, channels)`.
pub type InputTensor = Array4<f32>;

/// Per-timestep class scores, laid out `(timesteps, classes)`.
pub type LogitsMatrix = Array2<f32>;

/// Fixed input size a recognition model declares for its image input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputGeometry {
    pub height: usize,
    pub width: usize,
    pub channels: usize,
}

impl InputGeometry {
    pub fn new(height: usize, width: usize, channels: usize) -> Self {
        Self { height, width, channels }
    }

    /// Reads an NHWC input declaration such as `[-1, 32, 128, 3]`.
    ///
    /// The batch axis may be dynamic; height, width and channels must be fixed.
    pub fn from_nhwc_dims(dims: &[i64]) -> Result<Self, OcrError> {
        let [_batch, height, width, channels] = dims else {
            return Err(OcrError::Config(format!(
                "model input must be rank 4 (NHWC), got {dims:?}"
            )));
        };
        let fixed = |d: i64, axis: &str| -> Result<usize, OcrError> {
            usize::try_from(d)
                .ok()
                .filter(|&d| d > 0)
                .ok_or_else(|| OcrError::Config(format!("model input {axis} is not static: {d}")))
        };
        Ok(Self {
            height: fixed(*height, "height")?,
            width: fixed(*width, "width")?,
            channels: fixed(*channels, "channels")?,
        })
    }

    pub fn tensor_shape(&self) -> (usize, usize, usize, usize) {
        (1, self.height, self.width, self.channels)
    }
}

/// Turns a raw model output into a `(timesteps, classes)` matrix.
///
/// Accepts `(1, T, C)` or an already squeezed `(T, C)` output.
pub fn logits_from_output(output: ArrayD<f32>) -> Result<LogitsMatrix, OcrError> {
    match output.ndim() {
        2 => output
            .into_dimensionality::<Ix2>()
            .map_err(|e| OcrError::Inference(e.to_string())),
        3 => {
            let batched = output
                .into_dimensionality::<Ix3>()
                .map_err(|e| OcrError::Inference(e.to_string()))?;
            if batched.shape()[0] != 1 {
                return Err(OcrError::Inference(format!(
                    "expected batch size 1, got {}",
                    batched.shape()[0]
                )));
            }
            Ok(batched.index_axis_move(ndarray::Axis(0), 0))
        }
        n => Err(OcrError::Inference(format!(
            "expected a rank 2 or 3 output, got rank {n}"
        ))),
    }
}
