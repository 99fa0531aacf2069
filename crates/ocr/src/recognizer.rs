use rxscan_core::{ChannelOrder, Vocabulary};
use thiserror::Error;

use crate::ctc;
use crate::engine::InferenceEngine;
use crate::preprocess::{Preprocessor, RawImage};
use crate::types::{self, InputGeometry};

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Image decode error: {0}")]
    Decode(String),
    #[error("Inference error: {0}")]
    Inference(String),
    #[error("Model configuration error: {0}")]
    Config(String),
    #[error("Model load error: {0}")]
    ModelLoad(String),
}

/// Abstraction over a handwriting recognizer.
/// Implementations accept raw PNG/JPEG image bytes and return the recognized text.
pub trait TextRecognizer: Send + Sync {
    fn recognize_bytes(&self, image_bytes: &[u8]) -> Result<String, OcrError>;
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Returns a pre-set string, for exercising the prescription pipeline
/// without a model file.
pub struct MockRecognizer {
    pub text: String,
}

impl MockRecognizer {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl TextRecognizer for MockRecognizer {
    fn recognize_bytes(&self, _image_bytes: &[u8]) -> Result<String, OcrError> {
        Ok(self.text.clone())
    }
}

// ── Model-backed recognizer ───────────────────────────────────────────────────

/// Turns an image into text with a CTC sequence model.
///
/// Immutable after construction; share it behind an `Arc`.
pub struct Recognizer<E: InferenceEngine> {
    engine: E,
    vocab: Vocabulary,
    preprocessor: Preprocessor,
}

impl<E: InferenceEngine> Recognizer<E> {
    /// Pairs a loaded engine with its vocabulary.
    ///
    /// Fails if the model's declared class count disagrees with the vocabulary
    /// or its input is not a 3-channel image.
    pub fn new(engine: E, vocab: Vocabulary, channel_order: ChannelOrder) -> Result<Self, OcrError> {
        if let Some(classes) = engine.output_classes() {
            if classes != vocab.class_count() {
                return Err(OcrError::Config(format!(
                    "model emits {classes} classes but the vocabulary needs {} ({} characters + blank)",
                    vocab.class_count(),
                    vocab.len()
                )));
            }
        }
        let preprocessor = Preprocessor::new(engine.input_geometry(), channel_order)?;
        Ok(Self { engine, vocab, preprocessor })
    }

    /// Preprocess, run one forward pass, and decode.
    pub fn recognize(&self, image: &RawImage) -> Result<String, OcrError> {
        let input = self.preprocessor.prepare(image);
        let output = self.engine.run(input)?;
        let logits = types::logits_from_output(output)?;
        ctc::greedy_decode(logits.view(), &self.vocab)
    }

    pub fn geometry(&self) -> InputGeometry {
        self.preprocessor.geometry()
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }
}

impl<E: InferenceEngine> TextRecognizer for Recognizer<E> {
    fn recognize_bytes(&self, image_bytes: &[u8]) -> Result<String, OcrError> {
        let image = RawImage::decode(image_bytes)?;
        self.recognize(&image)
    }
}

#[cfg(feature = "onnx")]
impl Recognizer<crate::engine::onnx::OnnxEngine> {
    pub fn from_config(config: &rxscan_core::ModelConfig) -> Result<Self, OcrError> {
        let engine = crate::engine::onnx::OnnxEngine::load(&config.path, config.intra_threads)?;
        Self::new(engine, config.vocab.clone(), config.channel_order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::InputTensor;
    use image::{DynamicImage, ImageBuffer, Rgb};
    use ndarray::{Array2, ArrayD, IxDyn};
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    /// Engine that returns a fixed score matrix for every input.
    struct FixedEngine {
        geometry: InputGeometry,
        classes: Option<usize>,
        output: ArrayD<f32>,
        seen: Mutex<Vec<Vec<usize>>>,
    }

    impl FixedEngine {
        fn with_path(path: &[usize], classes: usize) -> Self {
            let mut m = Array2::<f32>::zeros((path.len(), classes));
            for (t, &c) in path.iter().enumerate() {
                m[[t, c]] = 1.0;
            }
            let output = m.insert_axis(ndarray::Axis(0)).into_dyn();
            Self {
                geometry: InputGeometry::new(32, 128, 3),
                classes: Some(classes),
                output,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl InferenceEngine for FixedEngine {
        fn input_geometry(&self) -> InputGeometry {
            self.geometry
        }

        fn output_classes(&self) -> Option<usize> {
            self.classes
        }

        fn run(&self, input: InputTensor) -> Result<ArrayD<f32>, OcrError> {
            self.seen.lock().unwrap().push(input.shape().to_vec());
            Ok(self.output.clone())
        }
    }

    /// Engine whose runtime always faults.
    struct BrokenEngine;

    impl InferenceEngine for BrokenEngine {
        fn input_geometry(&self) -> InputGeometry {
            InputGeometry::new(8, 8, 3)
        }

        fn output_classes(&self) -> Option<usize> {
            None
        }

        fn run(&self, _input: InputTensor) -> Result<ArrayD<f32>, OcrError> {
            Err(OcrError::Inference("engine fault".into()))
        }
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_fn(width, height, |x, _| Rgb([(x % 256) as u8, 40, 80]));
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    fn cat_vocab() -> Vocabulary {
        "cat".parse().unwrap()
    }

    #[test]
    fn mock_returns_preset_text() {
        let r = MockRecognizer::new("amoxicillin");
        assert_eq!(r.recognize_bytes(b"fake image data").unwrap(), "amoxicillin");
        assert_eq!(r.recognize_bytes(b"").unwrap(), "amoxicillin");
    }

    #[test]
    fn recognizes_cat_end_to_end() {
        let engine = FixedEngine::with_path(&[0, 0, 3, 1, 3, 2], 4);
        let r = Recognizer::new(engine, cat_vocab(), ChannelOrder::Bgr).unwrap();
        assert_eq!(r.recognize_bytes(&png(300, 90)).unwrap(), "cat");
        assert_eq!(r.engine().seen.lock().unwrap().clone(), vec![vec![1, 32, 128, 3]]);
    }

    #[test]
    fn all_blank_output_is_empty_text_not_error() {
        let engine = FixedEngine::with_path(&[3, 3, 3], 4);
        let r = Recognizer::new(engine, cat_vocab(), ChannelOrder::Bgr).unwrap();
        assert_eq!(r.recognize_bytes(&png(10, 10)).unwrap(), "");
    }

    #[test]
    fn declared_class_mismatch_fails_at_construction() {
        let engine = FixedEngine::with_path(&[0], 5);
        let err = Recognizer::new(engine, cat_vocab(), ChannelOrder::Bgr).err().unwrap();
        assert!(matches!(err, OcrError::Config(_)));
    }

    #[test]
    fn undeclared_class_mismatch_fails_at_decode() {
        let mut engine = FixedEngine::with_path(&[0, 1], 6);
        engine.classes = None;
        let r = Recognizer::new(engine, cat_vocab(), ChannelOrder::Bgr).unwrap();
        assert!(matches!(r.recognize_bytes(&png(4, 4)), Err(OcrError::Config(_))));
    }

    #[test]
    fn undecodable_image_is_a_decode_error() {
        let engine = FixedEngine::with_path(&[0], 4);
        let r = Recognizer::new(engine, cat_vocab(), ChannelOrder::Bgr).unwrap();
        assert!(matches!(r.recognize_bytes(b""), Err(OcrError::Decode(_))));
        assert!(matches!(r.recognize_bytes(b"GIF89a..."), Err(OcrError::Decode(_))));
        assert!(r.engine().seen.lock().unwrap().clone().is_empty());
    }

    #[test]
    fn engine_fault_is_an_inference_error() {
        let r = Recognizer::new(BrokenEngine, cat_vocab(), ChannelOrder::Rgb).unwrap();
        assert!(matches!(r.recognize_bytes(&png(4, 4)), Err(OcrError::Inference(_))));
    }

    #[test]
    fn unexpected_output_rank_is_an_inference_error() {
        let mut engine = FixedEngine::with_path(&[0], 4);
        engine.output = ArrayD::zeros(IxDyn(&[4]));
        let r = Recognizer::new(engine, cat_vocab(), ChannelOrder::Bgr).unwrap();
        assert!(matches!(r.recognize_bytes(&png(4, 4)), Err(OcrError::Inference(_))));
    }

    #[test]
    fn shared_recognizer_is_usable_from_many_threads() {
        let engine = FixedEngine::with_path(&[0, 3, 1, 3, 2], 4);
        let r = Arc::new(Recognizer::new(engine, cat_vocab(), ChannelOrder::Bgr).unwrap());
        let image = Arc::new(png(64, 16));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let r = Arc::clone(&r);
                let image = Arc::clone(&image);
                std::thread::spawn(move || r.recognize_bytes(&image).unwrap())
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), "cat");
        }
        assert_eq!(r.engine().seen.lock().unwrap().clone().len(), 8);
    }
}
