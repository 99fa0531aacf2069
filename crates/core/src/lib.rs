pub mod config;
pub mod label;
pub mod prescription;
pub mod vocab;

pub use config::{
    AppConfig, ChannelOrder, ConfigError, LogFormat, ModelConfig, OpenFdaConfig, ServerConfig,
    StorageConfig,
};
pub use label::{
    or_not_available, DrugLabel, LabelError, LabelSource, StaticLabelSource, NOT_AVAILABLE,
};
pub use prescription::{PrescriptionForm, PrescriptionRecord};
pub use vocab::{Vocabulary, VocabularyError};
