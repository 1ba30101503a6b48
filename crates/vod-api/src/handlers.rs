//! Request handlers.

use std::path::Path;

use axum::extract::{Multipart, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tracing::info;
use uuid::Uuid;

use vod_models::{Job, ResourceSnapshot, SeparationMethod};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Service banner.
#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: &'static str,
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "VOD Processor API",
        status: "operational",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Health response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: String,
}

/// Health check endpoint (liveness probe).
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Current host stats plus the probed separation methods.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub resources: ResourceSnapshot,
    pub available_methods: Vec<SeparationMethod>,
}

pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        resources: state.monitor.snapshot().await,
        available_methods: state.capabilities.available_methods(),
    })
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub file_id: String,
    pub filename: String,
    pub status: &'static str,
    pub size_mb: f64,
}

/// Accept a video upload and queue it for the worker.
///
/// The stored name embeds a fresh UUID so repeated uploads of the same
/// filename never collide. Unsupported extensions are rejected before
/// anything touches disk. No pipeline stage runs here; the worker's next
/// scan picks the file up.
pub async fn upload_video(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(sanitize_filename)
            .ok_or_else(|| ApiError::bad_request("Missing filename"))?;

        if !Job::is_supported_video(Path::new(&filename)) {
            return Err(ApiError::bad_request("Invalid file format"));
        }

        let file_id = Uuid::new_v4().to_string();
        let stored_name = format!("{file_id}_{filename}");
        let dest = state.config.incoming_dir.join(&stored_name);

        tokio::fs::create_dir_all(&state.config.incoming_dir).await?;

        let mut file = tokio::fs::File::create(&dest).await?;
        let mut field = field;
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| ApiError::bad_request(format!("Upload interrupted: {e}")))?
        {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        let size = tokio::fs::metadata(&dest).await?.len();
        info!("Queued upload {} ({} bytes)", stored_name, size);

        return Ok(Json(UploadResponse {
            file_id,
            filename,
            status: "queued",
            size_mb: size as f64 / 1e6,
        }));
    }

    Err(ApiError::bad_request("Missing file field"))
}

#[derive(Debug, Serialize)]
pub struct VideoEntry {
    pub filename: String,
    pub size_mb: f64,
    pub modified: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct VideoListResponse {
    pub videos: Vec<VideoEntry>,
}

/// List processed artifacts, newest first.
pub async fn list_videos(State(state): State<AppState>) -> ApiResult<Json<VideoListResponse>> {
    let mut videos = Vec::new();

    if state.config.output_dir.exists() {
        let mut entries = tokio::fs::read_dir(&state.config.output_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().map(|e| e == "mp4").unwrap_or(false) {
                let meta = entry.metadata().await?;
                let modified: DateTime<Utc> = meta
                    .modified()
                    .map(DateTime::from)
                    .unwrap_or_else(|_| Utc::now());
                videos.push(VideoEntry {
                    filename: entry.file_name().to_string_lossy().into_owned(),
                    size_mb: meta.len() as f64 / 1e6,
                    modified,
                });
            }
        }
    }

    videos.sort_by(|a, b| b.modified.cmp(&a.modified));
    Ok(Json(VideoListResponse { videos }))
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: &'static str,
}

/// Delete a processed artifact by filename.
pub async fn delete_video(
    State(state): State<AppState>,
    axum::extract::Path(filename): axum::extract::Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    if !is_valid_output_name(&filename) {
        return Err(ApiError::bad_request("Invalid video name"));
    }

    let path = state.config.output_dir.join(&filename);
    if !path.is_file() {
        return Err(ApiError::not_found("Video not found"));
    }

    tokio::fs::remove_file(&path).await?;
    info!("Deleted video: {}", filename);
    Ok(Json(DeleteResponse {
        message: "Video deleted",
    }))
}

/// Strip any path components an uploader sneaks into the filename.
fn sanitize_filename(raw: &str) -> String {
    Path::new(raw)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// A deletable name is a bare `.mp4` filename with no traversal parts.
fn is_valid_output_name(name: &str) -> bool {
    name.ends_with(".mp4")
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains("..")
}
