use rxscan_core::{DrugLabel, LabelError};
use serde::Deserialize;

/// Body of `GET /drug/label.json`. Only the sections we display are read.
#[derive(Debug, Deserialize)]
pub struct LabelResponse {
    #[serde(default)]
    pub results: Vec<LabelResult>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LabelResult {
    pub purpose: Option<LabelText>,
    pub keep_out_of_reach_of_children: Option<LabelText>,
    pub warnings: Option<LabelText>,
    pub dosage_and_administration: Option<LabelText>,
    pub pregnancy_or_breast_feeding: Option<LabelText>,
    pub stop_use: Option<LabelText>,
}

/// openFDA sends label sections as string arrays; a bare string is accepted too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum LabelText {
    One(String),
    Many(Vec<String>),
}

impl LabelText {
    fn joined(self) -> Option<String> {
        let text = match self {
            LabelText::One(s) => s,
            LabelText::Many(parts) => parts.join("\n"),
        };
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

impl From<LabelResult> for DrugLabel {
    fn from(r: LabelResult) -> Self {
        DrugLabel {
            purpose: r.purpose.and_then(LabelText::joined),
            keep_out_of_reach_of_children: r
                .keep_out_of_reach_of_children
                .and_then(LabelText::joined),
            warnings: r.warnings.and_then(LabelText::joined),
            dosage_and_administration: r.dosage_and_administration.and_then(LabelText::joined),
            pregnancy_or_breast_feeding: r.pregnancy_or_breast_feeding.and_then(LabelText::joined),
            stop_use: r.stop_use.and_then(LabelText::joined),
        }
    }
}

/// First label in a response body, or `None` when `results` is empty.
pub fn parse_label_response(body: &str) -> Result<Option<DrugLabel>, LabelError> {
    let response: LabelResponse =
        serde_json::from_str(body).map_err(|e| LabelError::Parse(e.to_string()))?;
    Ok(response.results.into_iter().next().map(DrugLabel::from))
}
