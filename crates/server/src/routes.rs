use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use rxscan_core::LabelSource;
use rxscan_ocr::TextRecognizer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

pub fn create_router<R, L>(state: AppState<R, L>, max_upload_bytes: usize) -> Router
where
    R: TextRecognizer + 'static,
    L: LabelSource + 'static,
{
    Router::new()
        .route("/", get(handlers::index).post(handlers::submit_form::<R, L>))
        .route("/upload", post(handlers::upload::<R, L>))
        .route(
            "/api/prescriptions",
            get(handlers::list_prescriptions::<R, L>),
        )
        .route("/health", get(handlers::health))
        // Multipart bodies carry their own 2 MiB default; the configured limit replaces it.
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
