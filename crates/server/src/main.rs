mod error;
mod handlers;
mod html;
mod routes;
mod state;

use anyhow::Context;
use clap::Parser;
use rxscan_core::{AppConfig, LogFormat};
use rxscan_ocr::{PrescriptionPipeline, Recognizer};
use rxscan_openfda::OpenFdaClient;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::routes::create_router;
use crate::state::AppState;

#[derive(Parser)]
#[command(name = "rxscan-server")]
#[command(about = "Reads handwritten prescriptions and looks up the drug label")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(long, env = "RXSCAN_CONFIG", default_value = "rxscan.toml")]
    config: PathBuf,
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());

    match format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(JsonStorageLayer)
            .with(BunyanFormattingLayer::new("rxscan".into(), std::io::stdout))
            .init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = AppConfig::load(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    init_tracing(config.server.log_format);

    tracing::info!("Loading recognition model: {}...", config.model.path.display());
    let recognizer = Recognizer::from_config(&config.model)?;
    tracing::info!(
        "Model ready: {} (input {:?}, {} characters)",
        recognizer.engine().model_path().display(),
        recognizer.geometry().tensor_shape(),
        recognizer.vocabulary().len()
    );

    let labels = OpenFdaClient::new(&config.openfda)?;
    tracing::info!("Drug labels from {}", labels.base_url());

    let db_path = config.storage.db_path();
    tracing::info!("Opening database: {}...", db_path.display());
    let db = rxscan_storage::create_db(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    let pipeline = PrescriptionPipeline::new(
        Arc::new(recognizer),
        labels,
        config.storage.uploads_dir(),
    );
    let app = create_router(AppState::new(pipeline, db), config.server.max_upload_bytes);

    let listener = TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind to address {}", config.server.bind))?;

    tracing::info!("Server starting on http://{}", listener.local_addr()?);
    tracing::info!("  GET  /                 - Upload form");
    tracing::info!("  POST /                 - Form submission (HTML)");
    tracing::info!("  POST /upload           - Multipart upload (JSON)");
    tracing::info!("  GET  /api/prescriptions - Recent prescriptions");
    tracing::info!("  GET  /health           - Health check");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server failed")?;

    Ok(())
}
