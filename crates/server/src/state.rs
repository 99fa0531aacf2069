use rxscan_core::LabelSource;
use rxscan_ocr::{PrescriptionPipeline, TextRecognizer};
use rxscan_storage::DbPool;
use std::sync::Arc;

pub struct AppState<R: TextRecognizer, L: LabelSource> {
    pub pipeline: Arc<PrescriptionPipeline<R, L>>,
    pub db: DbPool,
}

impl<R: TextRecognizer, L: LabelSource> AppState<R, L> {
    pub fn new(pipeline: PrescriptionPipeline<R, L>, db: DbPool) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            db,
        }
    }
}

// Manual impl: a derive would demand `R: Clone` and `L: Clone`.
impl<R: TextRecognizer, L: LabelSource> Clone for AppState<R, L> {
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
            db: self.db.clone(),
        }
    }
}
