use rxscan_core::{DrugLabel, LabelSource};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::hash;
use crate::recognizer::{OcrError, TextRecognizer};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Handwriting recognition failed: {0}")]
    Ocr(#[from] OcrError),
    #[error("Recognition task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// The result of processing one uploaded prescription image.
#[derive(Debug, Clone, Serialize)]
pub struct PrescriptionOutcome {
    /// SHA-256 hex digest of the upload, the content-addressed key.
    pub upload_hash: String,
    /// Where the upload was stored in the uploads tree.
    pub upload_path: PathBuf,
    /// Word recognized from the handwriting (possibly empty).
    pub interpreted_word: String,
    /// Drug label found for the word, if any.
    pub label: Option<DrugLabel>,
}

/// Orchestrates: hash → content-store → recognize → label lookup.
pub struct PrescriptionPipeline<R: TextRecognizer, L: LabelSource> {
    recognizer: Arc<R>,
    labels: L,
    uploads_dir: PathBuf,
}

impl<R, L> PrescriptionPipeline<R, L>
where
    R: TextRecognizer + 'static,
    L: LabelSource,
{
    pub fn new(recognizer: Arc<R>, labels: L, uploads_dir: PathBuf) -> Self {
        Self { recognizer, labels, uploads_dir }
    }

    pub fn recognizer(&self) -> &Arc<R> {
        &self.recognizer
    }

    /// Process raw upload bytes; `file_name` only contributes its extension.
    pub async fn process_bytes(
        &self,
        data: &[u8],
        file_name: Option<&str>,
    ) -> Result<PrescriptionOutcome, PipelineError> {
        // 1. Hash for content addressing.
        let upload_hash = hash::to_hex(&hash::sha256_bytes(data));

        // 2. Persist to content-addressed store.
        let ext = hash::upload_extension(file_name);
        let dest = hash::upload_path(&self.uploads_dir, &upload_hash, &ext);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&dest, data).await?;

        // 3. Recognize on the blocking pool; inference holds the thread until done.
        let recognizer = Arc::clone(&self.recognizer);
        let bytes = data.to_vec();
        let interpreted_word =
            tokio::task::spawn_blocking(move || recognizer.recognize_bytes(&bytes)).await??;
        tracing::info!(hash = %upload_hash, word = %interpreted_word, "prescription recognized");

        // 4. Look up the drug label. A failed lookup leaves the outcome without one.
        let label = self.lookup_label(&interpreted_word).await;

        Ok(PrescriptionOutcome {
            upload_hash,
            upload_path: dest,
            interpreted_word,
            label,
        })
    }

    async fn lookup_label(&self, word: &str) -> Option<DrugLabel> {
        let word = word.trim();
        if word.is_empty() {
            return None;
        }
        match self.labels.lookup(word).await {
            Ok(label) => label,
            Err(e) => {
                tracing::warn!("Drug label lookup for '{word}' failed: {e}");
                None
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
