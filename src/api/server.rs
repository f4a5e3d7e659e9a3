use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use rust_embed::Embed;
use serde::Serialize;
use tempfile::NamedTempFile;
use tower_http::limit::RequestBodyLimitLayer;

use crate::detect::PersonDetector;
use crate::pipeline;
use crate::store::FrameStore;

/// Container formats the uploader accepts.
const SUPPORTED_FORMATS: [&str; 5] = ["mp4", "mov", "avi", "asf", "m4v"];

const MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

#[derive(Embed)]
#[folder = "src/assets/"]
struct Assets;

#[derive(Clone)]
pub struct AppState {
    store: FrameStore,
    detector: Arc<Mutex<PersonDetector>>,
    active_job: Arc<Mutex<Option<Arc<AtomicBool>>>>,
    output_scale: f64,
}

impl AppState {
    pub fn new(detector: PersonDetector, output_scale: f64) -> Self {
        Self {
            store: FrameStore::new(),
            detector: Arc::new(Mutex::new(detector)),
            active_job: Arc::new(Mutex::new(None)),
            output_scale,
        }
    }

    /// Signal the active worker to stop. Returns false when no run is active.
    pub fn stop_active(&self) -> bool {
        match self.active_job.lock().unwrap().take() {
            Some(flag) => {
                flag.store(true, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    /// Start processing an uploaded video, stopping any previous run first.
    fn start_job(&self, video: NamedTempFile) {
        let shutdown = Arc::new(AtomicBool::new(false));
        if let Some(prev) = self
            .active_job
            .lock()
            .unwrap()
            .replace(Arc::clone(&shutdown))
        {
            prev.store(true, Ordering::Relaxed);
        }

        let _ = pipeline::spawn_video_worker(
            video,
            Arc::clone(&self.detector),
            self.store.clone(),
            self.output_scale,
            shutdown,
        );
    }
}

#[derive(Serialize)]
struct StatusResponse {
    state: &'static str,
    persons: usize,
    frames: u64,
}

#[derive(Serialize)]
struct UploadResponse {
    status: &'static str,
    file: String,
}

pub async fn start_server(state: AppState, port: u16) -> Result<(), std::io::Error> {
    let app = Router::new()
        .route("/", get(index_handler))
        .route("/assets/{*path}", get(static_handler))
        .route("/api/videos", post(upload_handler))
        .route("/api/frame", get(frame_handler))
        .route("/api/status", get(status_handler))
        .route("/api/stop", post(stop_handler))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_UPLOAD_BYTES))
        .with_state(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("starting HTTP server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

async fn index_handler() -> impl IntoResponse {
    match Assets::get("index.html") {
        Some(content) => Html(content.data.to_vec()).into_response(),
        None => (StatusCode::NOT_FOUND, "index.html not found").into_response(),
    }
}

async fn static_handler(Path(path): Path<String>) -> impl IntoResponse {
    match Assets::get(&path) {
        Some(content) => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            (
                [(header::CONTENT_TYPE, mime.as_ref())],
                content.data.to_vec(),
            )
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, "not found").into_response(),
    }
}

async fn upload_handler(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(_) => {
                return (StatusCode::BAD_REQUEST, "malformed multipart body").into_response()
            }
        };

        if field.name() != Some("video") {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        if !supported_format(&file_name) {
            return (StatusCode::BAD_REQUEST, "unsupported video format").into_response();
        }

        let data = match field.bytes().await {
            Ok(data) => data,
            Err(_) => return (StatusCode::BAD_REQUEST, "failed to read upload").into_response(),
        };

        let mut video = match NamedTempFile::new() {
            Ok(file) => file,
            Err(e) => {
                tracing::error!(error = %e, "failed to create temp file");
                return (StatusCode::INTERNAL_SERVER_ERROR, "temp file error").into_response();
            }
        };
        if let Err(e) = video.write_all(&data) {
            tracing::error!(error = %e, "failed to write upload");
            return (StatusCode::INTERNAL_SERVER_ERROR, "temp file error").into_response();
        }

        tracing::info!(file = %file_name, bytes = data.len(), "video uploaded");
        state.start_job(video);

        return axum::Json(UploadResponse {
            status: "processing",
            file: file_name,
        })
        .into_response();
    }

    (StatusCode::BAD_REQUEST, "missing video field").into_response()
}

async fn frame_handler(State(state): State<AppState>) -> Response {
    match state.store.latest_frame() {
        Some(frame) => ([(header::CONTENT_TYPE, "image/jpeg")], frame).into_response(),
        None => (StatusCode::NOT_FOUND, "no frame available").into_response(),
    }
}

async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let status = state.store.status();
    axum::Json(StatusResponse {
        state: status.state.as_str(),
        persons: status.person_count,
        frames: status.frames_processed,
    })
}

async fn stop_handler(State(state): State<AppState>) -> Response {
    if state.stop_active() {
        (StatusCode::OK, "stopping").into_response()
    } else {
        (StatusCode::NOT_FOUND, "no active video").into_response()
    }
}

fn supported_format(file_name: &str) -> bool {
    let Some((_, ext)) = file_name.rsplit_once('.') else {
        return false;
    };
    let ext = ext.to_ascii_lowercase();
    SUPPORTED_FORMATS.iter().any(|&f| f == ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supported_formats_match_the_uploader_list() {
        assert!(supported_format("walkway.mp4"));
        assert!(supported_format("CLIP.MOV"));
        assert!(supported_format("a.b.m4v"));
        assert!(!supported_format("notes.txt"));
        assert!(!supported_format("no-extension"));
    }
}
