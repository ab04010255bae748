use std::fmt;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Extension, Json},
    http::StatusCode,
    routing::{any, post},
    Router,
};
use serde::de::DeserializeOwned;
use tokio::task::JoinError;

use crate::models::{
    BridgeResponse, ErrorKind, FileRequest, FolderRequest, HealthResponse, ProjectsResponse,
    TransferError,
};
use crate::transfer::TransferEngine;

pub struct AppState {
    pub engine: Arc<TransferEngine>,
}

impl AppState {
    pub fn new(engine: Arc<TransferEngine>) -> Self {
        Self { engine }
    }
}

type Reply = (StatusCode, Json<BridgeResponse>);

pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/upload", post(upload).fallback(method_not_allowed))
        .route("/upload-folder", post(upload_folder).fallback(method_not_allowed))
        .route("/download", post(download).fallback(method_not_allowed))
        .route("/download-folder", post(download_folder).fallback(method_not_allowed))
        .route("/health", any(health))
        .route("/projects", any(list_projects))
        .layer(Extension(state))
}

/// Failure of a handler's blocking task
enum TaskError {
    Transfer(TransferError),
    Aborted(JoinError),
}

impl TaskError {
    fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Transfer(e) => Some(e.kind()),
            Self::Aborted(_) => None,
        }
    }
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transfer(e) => write!(f, "{}", e),
            Self::Aborted(e) => write!(f, "transfer task aborted: {}", e),
        }
    }
}

/// Run a blocking engine call on the blocking pool.
async fn run_blocking<T, F>(f: F) -> Result<T, TaskError>
where
    F: FnOnce() -> Result<T, TransferError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result.map_err(TaskError::Transfer),
        Err(e) => Err(TaskError::Aborted(e)),
    }
}

fn reply(status: StatusCode, body: BridgeResponse) -> Reply {
    (status, Json(body))
}

/// Decode a JSON body regardless of its content type.
fn decode<T: DeserializeOwned>(body: &Bytes) -> Result<T, Reply> {
    serde_json::from_slice(body).map_err(|e| {
        reply(
            StatusCode::BAD_REQUEST,
            BridgeResponse::error(format!("Invalid JSON: {}", e)),
        )
    })
}

/// Statuses shared by every transfer endpoint.
fn common_failure(err: &TaskError, prefix: &str, file: &str) -> Reply {
    match err.kind() {
        Some(ErrorKind::Forbidden) => reply(
            StatusCode::FORBIDDEN,
            BridgeResponse::error("Project not registered"),
        ),
        Some(ErrorKind::Input) => reply(
            StatusCode::BAD_REQUEST,
            BridgeResponse::error_for(format!("{}: {}", prefix, err), file),
        ),
        _ => reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            BridgeResponse::error_for(format!("{}: {}", prefix, err), file),
        ),
    }
}

async fn method_not_allowed() -> Reply {
    reply(
        StatusCode::METHOD_NOT_ALLOWED,
        BridgeResponse::error("Only POST method is allowed"),
    )
}

async fn upload(Extension(state): Extension<Arc<AppState>>, body: Bytes) -> Reply {
    let req: FileRequest = match decode(&body) {
        Ok(req) => req,
        Err(rejection) => return rejection,
    };
    if !req.is_complete() {
        return reply(
            StatusCode::BAD_REQUEST,
            BridgeResponse::error("base_root and file_path are required"),
        );
    }

    let engine = Arc::clone(&state.engine);
    let (project, path) = (req.base_root.clone(), req.file_path.clone());
    match run_blocking(move || engine.upload_file(&project, &path)).await {
        Ok(_) => reply(
            StatusCode::OK,
            BridgeResponse::success("File uploaded successfully", req.file_path),
        ),
        Err(e) => match e.kind() {
            Some(ErrorKind::OutOfScope) => reply(
                StatusCode::BAD_REQUEST,
                BridgeResponse::error("File path must be within the project base path"),
            ),
            Some(ErrorKind::NotFound) => reply(
                StatusCode::NOT_FOUND,
                BridgeResponse::error("File does not exist"),
            ),
            _ => common_failure(&e, "Upload failed", &req.file_path),
        },
    }
}

async fn upload_folder(Extension(state): Extension<Arc<AppState>>, body: Bytes) -> Reply {
    let req: FolderRequest = match decode(&body) {
        Ok(req) => req,
        Err(rejection) => return rejection,
    };
    if !req.is_complete() {
        return reply(
            StatusCode::BAD_REQUEST,
            BridgeResponse::error("base_root and folder_path are required"),
        );
    }

    let engine = Arc::clone(&state.engine);
    let (project, path) = (req.base_root.clone(), req.folder_path.clone());
    match run_blocking(move || engine.upload_folder(&project, &path)).await {
        Ok(outcome) => reply(
            StatusCode::OK,
            BridgeResponse::success(
                format!(
                    "Folder uploaded successfully ({} files)",
                    outcome.files_succeeded
                ),
                req.folder_path,
            ),
        ),
        Err(e) => common_failure(&e, "Folder upload failed", ""),
    }
}

async fn download(Extension(state): Extension<Arc<AppState>>, body: Bytes) -> Reply {
    let req: FileRequest = match decode(&body) {
        Ok(req) => req,
        Err(rejection) => return rejection,
    };
    if !req.is_complete() {
        return reply(
            StatusCode::BAD_REQUEST,
            BridgeResponse::error("base_root and file_path are required"),
        );
    }

    let engine = Arc::clone(&state.engine);
    let (project, path) = (req.base_root.clone(), req.file_path.clone());
    match run_blocking(move || engine.download_file(&project, &path)).await {
        Ok(_) => reply(
            StatusCode::OK,
            BridgeResponse::success("File downloaded successfully", req.file_path),
        ),
        Err(e) => common_failure(&e, "Download failed", &req.file_path),
    }
}

async fn download_folder(Extension(state): Extension<Arc<AppState>>, body: Bytes) -> Reply {
    let req: FolderRequest = match decode(&body) {
        Ok(req) => req,
        Err(rejection) => return rejection,
    };
    if !req.is_complete() {
        return reply(
            StatusCode::BAD_REQUEST,
            BridgeResponse::error("base_root and folder_path are required"),
        );
    }

    let engine = Arc::clone(&state.engine);
    let (project, path) = (req.base_root.clone(), req.folder_path.clone());
    match run_blocking(move || engine.download_folder(&project, &path)).await {
        // Per-entry failures are only logged by the engine
        Ok(_) => reply(
            StatusCode::OK,
            BridgeResponse::success("Folder downloaded successfully", req.folder_path),
        ),
        Err(e) => common_failure(&e, "Folder download failed", ""),
    }
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

async fn list_projects(Extension(state): Extension<Arc<AppState>>) -> Json<ProjectsResponse> {
    Json(ProjectsResponse::new(state.engine.registry().names()))
}
