//! HTTP Server for the Evalboard API.
//!
//! The server holds one dataset at a time. Uploads replace it atomically;
//! every view or export request builds its own controller from a snapshot.
//!
//! # API Endpoints
//!
//! | Method | Path              | Description                          |
//! |--------|-------------------|--------------------------------------|
//! | GET    | `/health`         | Health check                         |
//! | POST   | `/api/upload`     | Upload CSV, replaces the dataset     |
//! | POST   | `/api/view`       | View state → derived view            |
//! | POST   | `/api/export`     | View state → CSV of the visible rows |
//! | GET    | `/api/logs`       | SSE stream for real-time logs        |

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio::sync::RwLock;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::{AllowOrigin, CorsLayer};
use uuid::Uuid;

use super::logs::{log_error, log_info, log_success, LOG_BROADCASTER};
use super::types::{error_response, UploadResponse, ViewResponse};
use crate::config::{ServerConfig, CORS_ORIGIN_VAR};
use crate::error::{ConfigError, ExportError, ServerError, ServerResult};
use crate::export::{export_file_name, to_csv};
use crate::models::Evaluation;
use crate::transform::pipeline::{load_bytes, load_csv, LoadedDataset};
use crate::view::{ViewController, ViewState};

const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// The dataset currently served.
#[derive(Debug, Default)]
pub struct Dataset {
    /// `None` until something was loaded
    pub id: Option<String>,
    pub evaluations: Vec<Arc<Evaluation>>,
}

impl Dataset {
    fn from_loaded(loaded: LoadedDataset) -> Self {
        Self {
            id: Some(Uuid::new_v4().to_string()),
            evaluations: loaded.evaluations.into_iter().map(Arc::new).collect(),
        }
    }
}

/// Shared server state.
#[derive(Debug, Default)]
pub struct AppState {
    dataset: RwLock<Arc<Dataset>>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> Arc<Dataset> {
        self.dataset.read().await.clone()
    }

    /// Swap in a freshly loaded dataset and return its id.
    pub async fn replace(&self, loaded: LoadedDataset) -> String {
        let dataset = Dataset::from_loaded(loaded);
        let id = dataset.id.clone().unwrap_or_default();
        *self.dataset.write().await = Arc::new(dataset);
        id
    }

    /// Parse an upload and install it. The current dataset survives a failure.
    pub async fn upload(&self, bytes: &[u8]) -> ServerResult<UploadResponse> {
        let loaded = load_bytes(bytes)?;
        let mut response = UploadResponse::new(String::new(), &loaded);
        response.dataset_id = self.replace(loaded).await;
        Ok(response)
    }

    pub async fn view(&self, state: ViewState) -> ViewResponse {
        let dataset = self.snapshot().await;
        let controller = ViewController::with_state(dataset.evaluations.clone(), state);
        ViewResponse::new(dataset.id.clone(), &controller)
    }

    pub async fn export(&self, state: ViewState) -> ServerResult<String> {
        let dataset = self.snapshot().await;
        let controller = ViewController::with_state(dataset.evaluations.clone(), state);
        Ok(to_csv(controller.export_rows())?)
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::Pipeline(e) => {
                (StatusCode::UNPROCESSABLE_ENTITY, e.user_message().to_string())
            }
            ServerError::Export(ExportError::NoRows) => (StatusCode::BAD_REQUEST, self.to_string()),
            ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };
        (status, Json(error_response(&message))).into_response()
    }
}

/// Build the router around a shared state.
pub fn router(state: SharedState, cors_origin: Option<&str>) -> ServerResult<Router> {
    let origin = match cors_origin {
        Some(origin) => AllowOrigin::exact(HeaderValue::from_str(origin).map_err(|_| {
            ConfigError::InvalidValue {
                name: CORS_ORIGIN_VAR,
                value: origin.to_string(),
            }
        })?),
        None => AllowOrigin::any(),
    };

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    Ok(Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/upload", post(upload_csv))
        .route("/api/view", post(view))
        .route("/api/export", post(export_csv))
        .route("/api/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .with_state(state))
}

/// Start the HTTP server
pub async fn start_server(config: ServerConfig) -> ServerResult<()> {
    let state: SharedState = Arc::new(AppState::new());

    if let Some(path) = &config.data {
        match load_csv(path) {
            Ok(loaded) => {
                let id = state.replace(loaded).await;
                log_success(format!("Preloaded {} as dataset {}", path.display(), id));
            }
            // Serve an empty dataset rather than refusing to start
            Err(e) => log_error(format!("{}: {}", e.user_message(), e)),
        }
    }

    let app = router(state, config.cors_origin.as_deref())?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Evalboard server running on http://localhost:{}", config.port);
    tracing::info!("   POST /api/upload - Upload CSV file");
    tracing::info!("   POST /api/view   - Derived view");
    tracing::info!("   POST /api/export - CSV export");
    tracing::info!("   GET  /api/logs   - SSE log stream");
    tracing::info!("   GET  /health     - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "evalboard",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Upload CSV endpoint
async fn upload_csv(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> ServerResult<Json<UploadResponse>> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        if field.name() == Some("file") {
            file_name = field.file_name().map(|s| s.to_string());
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
            file_data = Some(bytes.to_vec());
        }
    }

    let bytes = file_data.ok_or_else(|| ServerError::BadRequest("No file provided".to_string()))?;

    log_info(format!(
        "📄 New upload: {} ({} bytes)",
        file_name.as_deref().unwrap_or("unknown"),
        bytes.len()
    ));

    let response = state.upload(&bytes).await.map_err(|e| {
        log_error(format!("Upload rejected: {}", e));
        e
    })?;

    Ok(Json(response))
}

async fn view(
    State(state): State<SharedState>,
    Json(view_state): Json<ViewState>,
) -> Json<ViewResponse> {
    Json(state.view(view_state).await)
}

async fn export_csv(
    State(state): State<SharedState>,
    Json(view_state): Json<ViewState>,
) -> ServerResult<impl IntoResponse> {
    let csv = state.export(view_state).await?;
    let file_name = export_file_name(chrono::Local::now().date_naive());

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", file_name)),
        ],
        csv,
    ))
}
