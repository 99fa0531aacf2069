//! Greedy CTC decoding.
//!
//! The model emits one score per class per timestep. The last class is the
//! blank. Decoding takes the best class at every timestep, merges runs of the
//! same class, then drops blanks, so `a a - a` reads as `aa` while `a a a`
//! reads as `a`.

use ndarray::ArrayView2;
use rxscan_core::Vocabulary;

use crate::recognizer::OcrError;

/// Decode a `(timesteps, classes)` score matrix into text.
///
/// Fails with [`OcrError::Config`] when the class axis is not exactly one
/// wider than the vocabulary.
pub fn greedy_decode(logits: ArrayView2<'_, f32>, vocab: &Vocabulary) -> Result<String, OcrError> {
    let classes = logits.ncols();
    if classes != vocab.class_count() {
        return Err(OcrError::Config(format!(
            "model emits {classes} classes but the vocabulary needs {} ({} characters + blank)",
            vocab.class_count(),
            vocab.len()
        )));
    }
    let path = best_path(logits);
    let text = collapse_path(&path, vocab);
    tracing::debug!(timesteps = path.len(), chars = text.chars().count(), "ctc decode");
    Ok(text)
}

/// Index of the highest score at each timestep.
///
/// Exact ties go to the lowest index; NaN never beats a number.
pub fn best_path(logits: ArrayView2<'_, f32>) -> Vec<usize> {
    logits
        .rows()
        .into_iter()
        .map(|row| {
            let mut best = 0;
            for (i, &score) in row.iter().enumerate().skip(1) {
                let current = row[best];
                if score > current || (current.is_nan() && !score.is_nan()) {
                    best = i;
                }
            }
            best
        })
        .collect()
}

/// Merge consecutive repeats, drop blanks, and map indices to characters.
pub fn collapse_path(path: &[usize], vocab: &Vocabulary) -> String {
    let blank = vocab.blank_index();
    let mut text = String::new();
    let mut previous = None;
    for &index in path {
        if previous != Some(index) && index != blank {
            // Indices past the blank cannot come from a validated matrix.
            if let Some(c) = vocab.get(index) {
                text.push(c);
            }
        }
        previous = Some(index);
    }
    text
}
