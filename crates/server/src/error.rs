use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use rxscan_ocr::{OcrError, PipelineError};
use thiserror::Error;

use crate::html;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Pipeline(PipelineError::Ocr(OcrError::Decode(_))) => StatusCode::BAD_REQUEST,
            ApiError::Pipeline(_) | ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) => "invalid_input",
            ApiError::Pipeline(PipelineError::Ocr(e)) => match e {
                OcrError::Decode(_) => "decode_error",
                OcrError::Inference(_) => "inference_error",
                OcrError::Config(_) => "config_error",
                OcrError::ModelLoad(_) => "model_load_error",
            },
            ApiError::Pipeline(PipelineError::Io(_)) => "io_error",
            ApiError::Pipeline(PipelineError::Task(_)) => "internal_error",
            ApiError::Storage(_) => "storage_error",
        }
    }

    fn log(&self, status: StatusCode) {
        if status.is_server_error() {
            tracing::error!("Request failed: {} ({})", self, status);
        } else {
            tracing::warn!("Request rejected: {} ({})", self, status);
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = serde_json::json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
            }
        });
        self.log(status);

        (status, Json(body)).into_response()
    }
}

/// An [`ApiError`] rendered as an HTML page, for the browser form flow.
#[derive(Debug)]
pub struct PageError(pub ApiError);

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status = err.status_code();
        let heading = match err.error_code() {
            "decode_error" => "Error reading image.",
            "invalid_input" => "The form could not be read.",
            _ => "Something went wrong.",
        };
        err.log(status);

        (status, Html(html::error_page(heading, &err.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_failures_are_client_errors() {
        let err = ApiError::from(PipelineError::Ocr(OcrError::Decode("bad png".into())));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "decode_error");
    }

    #[test]
    fn model_failures_are_server_errors() {
        for (e, code) in [
            (OcrError::Inference("x".into()), "inference_error"),
            (OcrError::Config("x".into()), "config_error"),
        ] {
            let err = ApiError::from(PipelineError::Ocr(e));
            assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(err.error_code(), code);
        }
    }

    #[tokio::test]
    async fn page_error_renders_html_with_the_same_status() {
        let err = PageError(PipelineError::Ocr(OcrError::Decode("bad <png>".into())).into());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("Error reading image."));
        assert!(html.contains("bad &lt;png&gt;"));
    }

    #[test]
    fn storage_failures_are_server_errors() {
        let err = ApiError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error_code(), "storage_error");
    }
}
