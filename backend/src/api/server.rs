//! HTTP Server for the Data Sweeper API.
//!
//! # API Endpoints
//!
//! | Method | Path                                           | Description                     |
//! |--------|------------------------------------------------|---------------------------------|
//! | GET    | `/health`                                      | Health check                    |
//! | GET    | `/api/logs`                                    | SSE stream for real-time logs   |
//! | POST   | `/api/sessions`                                | Create a session                |
//! | DELETE | `/api/sessions/{session}`                      | Drop a session                  |
//! | GET    | `/api/sessions/{session}/files`                | List uploaded files             |
//! | POST   | `/api/sessions/{session}/files`                | Upload one or more files        |
//! | GET    | `/api/sessions/{session}/files/{file}`         | File summary and preview        |
//! | DELETE | `/api/sessions/{session}/files/{file}`         | Remove a file                   |
//! | POST   | `/api/sessions/{session}/files/{file}/deduplicate` | Remove duplicate rows       |
//! | POST   | `/api/sessions/{session}/files/{file}/impute`  | Fill missing numeric values     |
//! | PUT    | `/api/sessions/{session}/files/{file}/columns` | Select columns                  |
//! | GET    | `/api/sessions/{session}/files/{file}/chart`   | Bar chart data                  |
//! | POST   | `/api/sessions/{session}/files/{file}/convert` | Download as CSV or Excel        |

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, HeaderName, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post, put},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::{cors::CorsLayer, services::ServeDir};

use super::logs::{log_info, LOG_BROADCASTER};
use super::types::{
    ChartQuery, ChartResponse, CleanResponse, ColumnsRequest, ConvertRequest, SessionResponse,
    UploadResponse,
};
use crate::config::Config;
use crate::error::{PipelineResult, ServerError, ServerResult};
use crate::models::UploadedFile;
use crate::session::{Command, CommandOutput, FileSummary, Session, SessionStore};

/// Header carrying the download file name.
pub const FILE_NAME_HEADER: &str = "x-file-name";

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            sessions: SessionStore::new(config.session_ttl()),
            config: Arc::new(config),
        }
    }
}

/// Build the router with all API routes.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([
            header::CONTENT_TYPE,
            header::CONTENT_DISPOSITION,
            HeaderName::from_static(FILE_NAME_HEADER),
        ]);

    let body_limit = DefaultBodyLimit::max(state.config.max_upload_bytes());
    let static_dir = state.config.static_dir.clone();

    let api = Router::new()
        .route("/health", get(health))
        .route("/api/logs", get(sse_logs))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/{session}", axum::routing::delete(delete_session))
        .route("/api/sessions/{session}/files", get(list_files).post(upload_files))
        .route(
            "/api/sessions/{session}/files/{file}",
            get(get_file).delete(delete_file),
        )
        .route("/api/sessions/{session}/files/{file}/deduplicate", post(deduplicate))
        .route("/api/sessions/{session}/files/{file}/impute", post(impute))
        .route("/api/sessions/{session}/files/{file}/columns", put(set_columns))
        .route("/api/sessions/{session}/files/{file}/chart", get(chart))
        .route("/api/sessions/{session}/files/{file}/convert", post(convert));

    let app = match static_dir {
        Some(dir) => api.fallback_service(ServeDir::new(dir)),
        None => api.route("/", get(health)),
    };

    app.layer(body_limit).layer(cors).with_state(state)
}

/// Start the HTTP server
pub async fn start_server(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let port = config.port;
    let max_upload_mb = config.max_upload_mb;
    let app = router(AppState::new(config));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 Data Sweeper server running on http://localhost:{}", port);
    println!("   POST /api/sessions                  - Create a session");
    println!("   POST /api/sessions/{{id}}/files       - Upload CSV / Excel files");
    println!("   GET  /api/logs                      - SSE log stream");
    println!("   GET  /health                        - Health check");
    println!("   Upload limit: {} MB", max_upload_mb);
    println!();

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "datasweep",
        "version": env!("CARGO_PKG_VERSION"),
        "sessions": state.sessions.len().await,
        "endpoints": {
            "sessions": "POST /api/sessions",
            "upload": "POST /api/sessions/{session}/files",
            "logs": "GET /api/logs (SSE)"
        }
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

// =============================================================================
// Sessions
// =============================================================================

async fn create_session(State(state): State<AppState>) -> Json<SessionResponse> {
    let session_id = state.sessions.create().await;
    log_info(format!("🆕 Session {}", session_id));
    Json(SessionResponse { session_id })
}

async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ServerResult<StatusCode> {
    if state.sessions.remove(&session_id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ServerError::UnknownSession(session_id))
    }
}

/// Run `f` against a session off the async workers, mapping unknown
/// sessions and pipeline errors.
async fn in_session<T, F>(state: &AppState, session_id: &str, f: F) -> ServerResult<T>
where
    F: FnOnce(&mut Session) -> PipelineResult<T> + Send + 'static,
    T: Send + 'static,
{
    state
        .sessions
        .with_session(session_id, f)
        .await
        .map_err(|e| ServerError::Internal(format!("session task failed: {}", e)))?
        .ok_or_else(|| ServerError::UnknownSession(session_id.to_string()))?
        .map_err(ServerError::from)
}

// =============================================================================
// Files
// =============================================================================

async fn list_files(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ServerResult<Json<Vec<FileSummary>>> {
    in_session(&state, &session_id, |s| Ok(s.summaries())).await.map(Json)
}

/// Multipart upload; every `file` / `files` field is one upload.
async fn upload_files(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    mut multipart: Multipart,
) -> ServerResult<Json<UploadResponse>> {
    let mut uploads = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name != "file" && name != "files" {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
        uploads.push(UploadedFile::new(file_name, bytes.to_vec()));
    }

    if uploads.is_empty() {
        return Err(ServerError::BadRequest("No file provided".to_string()));
    }

    println!("\n{}", "=".repeat(70));
    for upload in &uploads {
        println!("📄 NEW UPLOAD: {} ({})", upload.name, upload.size_label());
    }
    println!("{}\n", "=".repeat(70));

    let outcomes = in_session(&state, &session_id, move |s| Ok(s.add_batch(uploads))).await?;
    Ok(Json(UploadResponse::new(session_id, outcomes)))
}

async fn get_file(
    State(state): State<AppState>,
    Path((session_id, file_id)): Path<(String, String)>,
) -> ServerResult<Json<FileSummary>> {
    in_session(&state, &session_id, move |s| s.summary(&file_id)).await.map(Json)
}

async fn delete_file(
    State(state): State<AppState>,
    Path((session_id, file_id)): Path<(String, String)>,
) -> ServerResult<StatusCode> {
    in_session(&state, &session_id, move |s| s.remove(&file_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Commands
// =============================================================================

async fn deduplicate(
    State(state): State<AppState>,
    Path((session_id, file_id)): Path<(String, String)>,
) -> ServerResult<Json<CleanResponse>> {
    clean_command(&state, &session_id, file_id, Command::Deduplicate).await
}

async fn impute(
    State(state): State<AppState>,
    Path((session_id, file_id)): Path<(String, String)>,
) -> ServerResult<Json<CleanResponse>> {
    clean_command(&state, &session_id, file_id, Command::Impute).await
}

async fn clean_command(
    state: &AppState,
    session_id: &str,
    file_id: String,
    command: Command,
) -> ServerResult<Json<CleanResponse>> {
    let (output, file) = in_session(state, session_id, move |s| {
        let output = s.execute(&file_id, command)?;
        Ok((output, s.summary(&file_id)?))
    })
    .await?;

    match output {
        CommandOutput::Cleaned(report) => Ok(Json(CleanResponse { report, file })),
        _ => Err(ServerError::Internal("unexpected command output".to_string())),
    }
}

async fn set_columns(
    State(state): State<AppState>,
    Path((session_id, file_id)): Path<(String, String)>,
    Json(body): Json<ColumnsRequest>,
) -> ServerResult<Json<FileSummary>> {
    in_session(&state, &session_id, move |s| {
        s.execute(&file_id, Command::Project { columns: body.columns })?;
        s.summary(&file_id)
    })
    .await
    .map(Json)
}

async fn chart(
    State(state): State<AppState>,
    Path((session_id, file_id)): Path<(String, String)>,
    Query(query): Query<ChartQuery>,
) -> ServerResult<Json<ChartResponse>> {
    let output = in_session(&state, &session_id, move |s| {
        s.execute(&file_id, Command::Chart { column: query.column })
    })
    .await?;

    match output {
        CommandOutput::Chart(chart) => Ok(Json(ChartResponse { chart })),
        _ => Err(ServerError::Internal("unexpected command output".to_string())),
    }
}

async fn convert(
    State(state): State<AppState>,
    Path((session_id, file_id)): Path<(String, String)>,
    Json(body): Json<ConvertRequest>,
) -> ServerResult<Response> {
    let output = in_session(&state, &session_id, move |s| {
        s.execute(&file_id, Command::Export { format: body.format })
    })
    .await?;

    let CommandOutput::Artifact(artifact) = output else {
        return Err(ServerError::Internal("unexpected command output".to_string()));
    };

    let header_name = header_safe(&artifact.file_name);
    let headers = [
        (header::CONTENT_TYPE, artifact.mime_type.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", header_name),
        ),
        (HeaderName::from_static(FILE_NAME_HEADER), header_name),
    ];

    Ok((headers, artifact.bytes).into_response())
}

/// Keep printable ASCII so the name fits in a header value.
fn header_safe(name: &str) -> String {
    name.chars()
        .map(|c| if (c.is_ascii_graphic() || c == ' ') && c != '"' { c } else { '_' })
        .collect()
}
