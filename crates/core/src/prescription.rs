use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::label::DrugLabel;

/// Who the prescription is for and who wrote it, as entered on the upload form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrescriptionForm {
    pub patient_name: String,
    pub doctor_name: String,
    pub hospital_name: String,
}

impl PrescriptionForm {
    pub fn new(
        patient_name: impl Into<String>,
        doctor_name: impl Into<String>,
        hospital_name: impl Into<String>,
    ) -> Self {
        Self {
            patient_name: patient_name.into().trim().to_string(),
            doctor_name: doctor_name.into().trim().to_string(),
            hospital_name: hospital_name.into().trim().to_string(),
        }
    }
}

/// A processed prescription as stored in the history table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrescriptionRecord {
    pub id: Option<i64>,
    #[serde(flatten)]
    pub form: PrescriptionForm,
    /// SHA-256 hex digest of the uploaded image.
    pub upload_hash: String,
    pub upload_path: String,
    /// Word recognized from the handwriting; may be empty.
    pub interpreted_word: String,
    #[serde(flatten)]
    pub label: DrugLabel,
    pub created_at: Option<DateTime<Utc>>,
}
