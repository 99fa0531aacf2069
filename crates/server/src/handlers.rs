use axum::body::Bytes;
use axum::extract::{Multipart, Query, State};
use axum::response::{Html, Json};
use chrono::Utc;
use rxscan_core::{DrugLabel, LabelSource, PrescriptionForm, PrescriptionRecord};
use rxscan_ocr::{PrescriptionOutcome, TextRecognizer};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Instant;

use crate::error::{ApiError, PageError};
use crate::html;
use crate::state::AppState;

pub const DEFAULT_LIST_LIMIT: u32 = 20;
pub const MAX_LIST_LIMIT: u32 = 100;

/// Fields collected from a multipart prescription upload.
#[derive(Debug, Default)]
struct UploadForm {
    patient_name: Option<String>,
    doctor_name: Option<String>,
    hospital_name: Option<String>,
    file: Option<UploadedFile>,
}

#[derive(Debug)]
struct UploadedFile {
    data: Bytes,
    file_name: Option<String>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart.next_field().await.map_err(|e| {
            ApiError::InvalidInput(format!("Failed to read multipart field: {e}"))
        })? {
            let field_name = field.name().unwrap_or_default().to_string();

            match field_name.as_str() {
                "patient_name" | "doctor_name" | "hospital_name" => {
                    let value = field.text().await.map_err(|e| {
                        ApiError::InvalidInput(format!("Failed to read field {field_name}: {e}"))
                    })?;
                    let slot = match field_name.as_str() {
                        "patient_name" => &mut form.patient_name,
                        "doctor_name" => &mut form.doctor_name,
                        _ => &mut form.hospital_name,
                    };
                    *slot = Some(value);
                }
                "prescription_file" | "file" => {
                    let file_name = field.file_name().map(str::to_string);
                    let data = field.bytes().await.map_err(|e| {
                        ApiError::InvalidInput(format!("Failed to read file data: {e}"))
                    })?;
                    if data.is_empty() {
                        return Err(ApiError::InvalidInput("Empty file".to_string()));
                    }
                    tracing::debug!("Received file: {} bytes", data.len());
                    form.file = Some(UploadedFile { data, file_name });
                }
                _ => {
                    tracing::debug!("Ignoring unknown field: {field_name}");
                }
            }
        }

        Ok(form)
    }

    fn take_file(&mut self) -> Result<UploadedFile, ApiError> {
        self.file
            .take()
            .ok_or_else(|| ApiError::InvalidInput("No prescription image provided".to_string()))
    }

    fn require_names(&mut self) -> Result<PrescriptionForm, ApiError> {
        fn required(value: Option<String>, name: &str) -> Result<String, ApiError> {
            value.ok_or_else(|| ApiError::InvalidInput(format!("Missing form field: {name}")))
        }
        Ok(PrescriptionForm::new(
            required(self.patient_name.take(), "patient_name")?,
            required(self.doctor_name.take(), "doctor_name")?,
            required(self.hospital_name.take(), "hospital_name")?,
        ))
    }
}

async fn process<R, L>(
    state: &AppState<R, L>,
    file: &UploadedFile,
) -> Result<PrescriptionOutcome, ApiError>
where
    R: TextRecognizer + 'static,
    L: LabelSource + 'static,
{
    let start = Instant::now();
    let request_id = uuid::Uuid::new_v4();
    tracing::info!(%request_id, bytes = file.data.len(), "Processing prescription upload");

    let outcome = state
        .pipeline
        .process_bytes(&file.data, file.file_name.as_deref())
        .await?;

    tracing::info!(
        %request_id,
        word = %outcome.interpreted_word,
        label_found = outcome.label.is_some(),
        "Prescription processed in {:.3}s",
        start.elapsed().as_secs_f32()
    );
    Ok(outcome)
}

pub async fn index() -> Html<String> {
    Html(html::index_page())
}

/// `POST /`: the HTML form flow. Every accepted upload is persisted; failures
/// render an error page rather than JSON.
pub async fn submit_form<R, L>(
    State(state): State<AppState<R, L>>,
    multipart: Multipart,
) -> Result<Html<String>, PageError>
where
    R: TextRecognizer + 'static,
    L: LabelSource + 'static,
{
    read_and_store(&state, multipart).await.map_err(PageError)
}

async fn read_and_store<R, L>(
    state: &AppState<R, L>,
    multipart: Multipart,
) -> Result<Html<String>, ApiError>
where
    R: TextRecognizer + 'static,
    L: LabelSource + 'static,
{
    let mut upload = UploadForm::read(multipart).await?;
    let form = upload.require_names()?;
    let file = upload.take_file()?;

    let outcome = process(state, &file).await?;
    let label = outcome.label.unwrap_or_default();

    let record = PrescriptionRecord {
        id: None,
        form,
        upload_hash: outcome.upload_hash,
        upload_path: outcome.upload_path.display().to_string(),
        interpreted_word: outcome.interpreted_word,
        label,
        created_at: Some(Utc::now()),
    };
    let id = rxscan_storage::insert_prescription(&state.db, &record).await?;
    tracing::info!(id, hash = %record.upload_hash, "Prescription stored");

    Ok(Html(html::result_page(
        &record.form,
        &record.interpreted_word,
        &record.label,
    )))
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub interpreted_word: String,
    #[serde(flatten)]
    pub label: DrugLabel,
}

/// `POST /upload`: JSON for the standalone client. Nothing is persisted.
pub async fn upload<R, L>(
    State(state): State<AppState<R, L>>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError>
where
    R: TextRecognizer + 'static,
    L: LabelSource + 'static,
{
    let mut form = UploadForm::read(multipart).await?;
    let file = form.take_file()?;
    let outcome = process(&state, &file).await?;

    Ok(Json(UploadResponse {
        interpreted_word: outcome.interpreted_word,
        label: outcome.label.unwrap_or_default(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<u32>,
}

pub async fn list_prescriptions<R, L>(
    State(state): State<AppState<R, L>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<PrescriptionRecord>>, ApiError>
where
    R: TextRecognizer + 'static,
    L: LabelSource + 'static,
{
    let limit = params
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);
    let records = rxscan_storage::list_recent_prescriptions(&state.db, limit).await?;
    Ok(Json(records))
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
