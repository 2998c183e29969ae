//! # intake-server
//!
//! HTTP endpoint for spreadsheet imports. `POST /imports` takes the raw file
//! as the request body and answers with the import response message.

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use clap::Parser;
use intake_sheet::ImportSource;
use intake_worker::{ImportResponse, ImportWorker, IntakeConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

/// Header echoing the id of the import request
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Command-line arguments.
#[derive(Parser)]
#[command(name = "intake-server", version, about = "HTTP endpoint for spreadsheet imports")]
struct Args {
    /// YAML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    worker: ImportWorker,
}

/// Health check response.
#[derive(Serialize, Deserialize)]
pub struct Health {
    /// Server status ("ok" when healthy).
    pub status: String,
    /// Server version from Cargo.toml.
    pub version: String,
}

/// Health check endpoint handler.
pub async fn health() -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Import endpoint handler.
///
/// 200 with `{ data, sheets }` on success, 422 with `{ error }` when the
/// upload cannot be read or parsed, 503 if the worker is gone.
pub async fn import(State(state): State<AppState>, body: Bytes) -> Response {
    let reply = match state.worker.submit(ImportSource::bytes(body.to_vec())).await {
        Ok(reply) => reply,
        Err(err) => {
            tracing::error!(%err, "import worker unavailable");
            let response = ImportResponse::Failure {
                error: err.to_string(),
            };
            return (StatusCode::SERVICE_UNAVAILABLE, Json(response)).into_response();
        }
    };

    let status = if reply.response.is_success() {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };

    let mut response = (status, Json(reply.response)).into_response();
    if let Ok(value) = HeaderValue::from_str(&reply.id.to_string()) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
    response
}

/// Create the application router.
///
/// This is separated from `main()` to allow testing.
pub fn create_router(worker: ImportWorker, body_limit: usize) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/imports", post(import))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { worker })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = IntakeConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    let options = config.extract.to_options()?;

    let worker = ImportWorker::spawn(&config.worker, options);
    let app = create_router(worker, config.server.body_limit_bytes);

    let listener = tokio::net::TcpListener::bind(&config.server.addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.addr))?;
    tracing::info!(addr = %config.server.addr, "intake-server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
