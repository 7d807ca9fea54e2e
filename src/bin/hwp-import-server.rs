//! HTTP server exposing the HWP import pipeline.
//!
//! Implements:
//! - POST /convert/hwp — multipart form with one `file` field, responds with
//!   `{"success": true, "html": "<fragment>"}` or
//!   `{"error": "<korean message>", "details": "<diagnostics>"}`
//! - GET /health — health check endpoint
//!
//! Error status mapping follows the production site: 400 for a missing
//! file, 404 when the hwp5html converter is not installed, 500 for
//! conversion and processing failures.

use std::sync::Arc;

use anyhow::Context;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Parser;
use serde::Serialize;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use hwp_import::{
    import_document, HwpImportError, ImportConfig, MemoryStore, ObjectStore, S3Store,
};

/// Uploads above this size are rejected outright; scanned bulletins top out
/// around 20 MB.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

// ── Configuration ────────────────────────────────────────────────────────

#[derive(Parser, Debug, Clone)]
#[command(name = "hwp-import-server")]
#[command(about = "HWP-to-HTML import server for the parish site")]
struct ServerConfig {
    /// TCP host to bind to
    #[arg(long, default_value = "0.0.0.0", env = "HWP_IMPORT_HOST")]
    host: String,

    /// TCP port to bind to
    #[arg(long, default_value = "8090", env = "HWP_IMPORT_PORT")]
    port: u16,

    /// Explicit path to the hwp5html executable (otherwise platform default)
    #[arg(long, env = "HWP5HTML_PATH")]
    converter_path: Option<std::path::PathBuf>,

    /// R2/S3 access key id
    #[arg(long, env = "R2_ACCESS_KEY_ID")]
    r2_access_key_id: Option<String>,

    /// R2/S3 secret access key
    #[arg(long, env = "R2_SECRET_ACCESS_KEY")]
    r2_secret_access_key: Option<String>,

    /// R2 endpoint or bare Cloudflare account id
    #[arg(long, env = "R2_ACCOUNT_ID")]
    r2_account_id: Option<String>,

    /// Bucket receiving re-hosted images
    #[arg(long, default_value = "r2bucket-dudol", env = "R2_BUCKET_NAME")]
    r2_bucket_name: String,

    /// S3 region ("auto" for R2)
    #[arg(long, default_value = "auto", env = "R2_S3_REGION")]
    r2_region: String,

    /// Public base URL for uploaded keys (e.g. https://cdn.example.org)
    #[arg(long, env = "R2_PUBLIC_DOMAIN")]
    public_domain: Option<String>,

    /// Job log path (best-effort transcript of the last import)
    #[arg(long, default_value = "hwp-process.log", env = "HWP_IMPORT_LOG")]
    log_path: std::path::PathBuf,

    /// Directory for debug artifact dumps (raw HTML, CSS, final fragment)
    #[arg(long, env = "HWP_IMPORT_DEBUG_DIR")]
    debug_dump_dir: Option<std::path::PathBuf>,
}

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    config: ImportConfig,
    store: Arc<dyn ObjectStore>,
    store_is_memory: bool,
}

// ── Error mapping ────────────────────────────────────────────────────────

/// Wraps library errors for the HTTP boundary: Korean user-facing message,
/// raw diagnostics in `details` for operators.
struct ApiError(HwpImportError);

impl From<HwpImportError> for ApiError {
    fn from(e: HwpImportError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorBody {
            error: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            details: Option<String>,
        }

        let (status, message) = match &self.0 {
            HwpImportError::MissingFile => (StatusCode::BAD_REQUEST, "파일이 없습니다."),
            HwpImportError::ToolUnavailable { .. } => {
                (StatusCode::NOT_FOUND, "HWP 변환 도구를 찾을 수 없습니다.")
            }
            HwpImportError::ConversionFailed { .. } | HwpImportError::ConversionTimeout { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "HWP 변환 실패")
            }
            HwpImportError::OutputNotFound { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "변환된 HTML 파일을 찾을 수 없습니다.",
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "처리 중 치명적 오류 발생",
            ),
        };

        let details = match self.0.converter_output() {
            Some((stdout, stderr)) => Some(format!("{}\n{stdout}\n{stderr}", self.0)),
            None => Some(self.0.to_string()),
        };

        warn!("import failed ({status}): {}", self.0);
        let body = ErrorBody {
            error: message.to_string(),
            details,
        };
        (status, Json(body)).into_response()
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    healthy: bool,
    version: &'static str,
    storage: &'static str,
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION"),
        storage: if state.store_is_memory { "memory" } else { "s3" },
    })
}

/// POST /convert/hwp
async fn convert_hwp_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| HwpImportError::Internal(format!("malformed multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or("input.hwp").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| HwpImportError::Internal(format!("failed to read upload: {e}")))?;
            file = Some((filename, bytes.to_vec()));
        }
    }

    let (filename, bytes) = file.ok_or(HwpImportError::MissingFile)?;
    info!("convert request: {} ({} bytes)", filename, bytes.len());

    // `import_document`'s future is not `Send` (it holds kuchikiki `Rc`-based
    // DOM nodes across awaits), so it cannot run directly inside an axum
    // handler; drive it to completion on a blocking thread instead.
    let handle = tokio::runtime::Handle::current();
    let output = tokio::task::spawn_blocking(move || {
        handle.block_on(import_document(
            &bytes,
            &filename,
            &state.config,
            state.store.as_ref(),
        ))
    })
    .await
    .map_err(|e| HwpImportError::Internal(format!("import task failed: {e}")))??;

    Ok(Json(json!({
        "success": true,
        "html": output.fragment,
    })))
}

// ── Startup ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let server_config = ServerConfig::parse();

    info!("Starting hwp-import-server v{}", env!("CARGO_PKG_VERSION"));
    info!("  Host: {}", server_config.host);
    info!("  Port: {}", server_config.port);

    let mut builder = ImportConfig::builder().log_path(server_config.log_path.clone());
    if let Some(ref path) = server_config.converter_path {
        builder = builder.converter_path(path);
    }
    if let Some(ref domain) = server_config.public_domain {
        builder = builder.public_domain(domain.as_str());
    }
    if let Some(ref dir) = server_config.debug_dump_dir {
        builder = builder.debug_dump_dir(dir);
    }
    let config = builder.build().context("invalid import configuration")?;

    // Object store: R2 when credentials are configured, in-memory otherwise.
    // The memory fallback keeps local development usable but serves nothing —
    // rewritten image URLs will 404.
    let (store, store_is_memory): (Arc<dyn ObjectStore>, bool) = match (
        &server_config.r2_access_key_id,
        &server_config.r2_secret_access_key,
        &server_config.r2_account_id,
    ) {
        (Some(key), Some(secret), Some(endpoint)) => {
            info!("  Storage: R2 bucket '{}'", server_config.r2_bucket_name);
            (
                Arc::new(S3Store::from_credentials(
                    key,
                    secret,
                    endpoint,
                    &server_config.r2_region,
                    server_config.r2_bucket_name.clone(),
                )),
                false,
            )
        }
        _ => {
            warn!("  Storage: IN-MEMORY (no R2 credentials configured)");
            warn!("  Set R2_ACCESS_KEY_ID, R2_SECRET_ACCESS_KEY, and R2_ACCOUNT_ID for production");
            (Arc::new(MemoryStore::new()), true)
        }
    };

    let state = AppState {
        config,
        store,
        store_is_memory,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/convert/hwp", post(convert_hwp_handler))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("{}:{}", server_config.host, server_config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        info!("Received Ctrl+C, initiating shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
        info!("Received SIGTERM, initiating shutdown");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
