use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use thiserror::Error;

/// Placeholder shown for a label section the drug database did not provide.
pub const NOT_AVAILABLE: &str = "N/A";

/// The consumer-facing sections of a drug label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrugLabel {
    pub purpose: Option<String>,
    pub keep_out_of_reach_of_children: Option<String>,
    pub warnings: Option<String>,
    pub dosage_and_administration: Option<String>,
    pub pregnancy_or_breast_feeding: Option<String>,
    pub stop_use: Option<String>,
}

impl DrugLabel {
    /// True when no section carries any text.
    pub fn is_empty(&self) -> bool {
        self.sections().iter().all(|(_, v)| v.is_none())
    }

    /// Section names paired with their values, in display order.
    pub fn sections(&self) -> [(&'static str, Option<&str>); 6] {
        [
            ("purpose", self.purpose.as_deref()),
            (
                "keep_out_of_reach_of_children",
                self.keep_out_of_reach_of_children.as_deref(),
            ),
            ("warnings", self.warnings.as_deref()),
            (
                "dosage_and_administration",
                self.dosage_and_administration.as_deref(),
            ),
            (
                "pregnancy_or_breast_feeding",
                self.pregnancy_or_breast_feeding.as_deref(),
            ),
            ("stop_use", self.stop_use.as_deref()),
        ]
    }
}

/// Renders an optional label section, substituting [`NOT_AVAILABLE`].
pub fn or_not_available(value: Option<&str>) -> &str {
    value.unwrap_or(NOT_AVAILABLE)
}

#[derive(Debug, Clone, Error)]
pub enum LabelError {
    #[error("Label service request failed: {0}")]
    Http(String),
    #[error("Label service returned HTTP {0}")]
    Status(u16),
    #[error("Label service response could not be parsed: {0}")]
    Parse(String),
}

/// Looks up the drug label for a recognized word.
///
/// `Ok(None)` means the source answered but knows no matching drug.
pub trait LabelSource: Send + Sync {
    fn lookup(
        &self,
        word: &str,
    ) -> impl Future<Output = Result<Option<DrugLabel>, LabelError>> + Send;
}

// ── In-memory source (offline use and tests) ──────────────────────────────────

/// Serves labels from a fixed table, keyed case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct StaticLabelSource {
    labels: HashMap<String, DrugLabel>,
}

impl StaticLabelSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_label(mut self, word: &str, label: DrugLabel) -> Self {
        self.labels.insert(word.to_lowercase(), label);
        self
    }
}

impl LabelSource for StaticLabelSource {
    async fn lookup(&self, word: &str) -> Result<Option<DrugLabel>, LabelError> {
        Ok(self.labels.get(&word.to_lowercase()).cloned())
    }
}
