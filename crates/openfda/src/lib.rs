pub mod client;
pub mod response;

pub use client::OpenFdaClient;
pub use response::{parse_label_response, LabelResponse};
