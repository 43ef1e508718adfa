//! Mission status and narration audio handlers.

use crate::api::{path_segment, ApiError};
use crate::AppState;
use axum::{
    extract::{Extension, Json, Path},
    http::header,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use stride_types::{StatusSnapshot, VoiceType};

/// One entry of the audio listing: the newest artifact of a voice type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioEntry {
    pub url: String,
    /// Playback state. Always `"new"`; playback is not tracked per listener.
    pub status: String,
    #[serde(rename = "type")]
    pub voice_type: VoiceType,
}

/// Handler for `GET /mission/{name}/status`.
///
/// Serves the latest published snapshot. The mission name is accepted for
/// URL compatibility; the server runs a single mission.
pub async fn status_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(_mission_name): Path<String>,
) -> Json<StatusSnapshot> {
    Json(*state.status.borrow())
}

/// Handler for `GET /mission/{name}/audio`.
///
/// Lists the most recently modified audio file of each voice type. Voice
/// types with no audio are left out.
pub async fn audio_list_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(mission_name): Path<String>,
) -> Result<Json<Vec<AudioEntry>>, ApiError> {
    path_segment(&mission_name, "mission name")?;
    let audio_dir = state.stories_dir.join(&mission_name).join("audio");

    let entries = tokio::task::spawn_blocking(move || {
        let mut entries = Vec::new();
        for voice_type in VoiceType::ALL {
            if let Some(file_name) = latest_audio_file(&audio_dir.join(voice_type.as_str())) {
                entries.push(AudioEntry {
                    url: format!("/audio/{}/{}/{}", mission_name, voice_type, file_name),
                    status: "new".to_string(),
                    voice_type,
                });
            }
        }
        entries
    })
    .await
    .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))?;

    Ok(Json(entries))
}

/// Newest non-transcript file in `dir`, by modification time.
fn latest_audio_file(dir: &FsPath) -> Option<String> {
    let read_dir = std::fs::read_dir(dir).ok()?;

    let mut latest: Option<(SystemTime, String)> = None;
    for entry in read_dir.flatten() {
        let path = entry.path();
        if !path.is_file() || path.extension().is_some_and(|ext| ext == "txt") {
            continue;
        }
        let Ok(modified) = entry.metadata().and_then(|m| m.modified()) else {
            continue;
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        if latest.as_ref().map_or(true, |(t, n)| (modified, &name) > (*t, n)) {
            latest = Some((modified, name));
        }
    }

    latest.map(|(_, name)| name)
}

/// Handler for `GET /audio/{name}/{voice_type}/{filename}`.
pub async fn audio_file_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path((mission_name, voice_type, file_name)): Path<(String, String, String)>,
) -> Result<Response, ApiError> {
    path_segment(&mission_name, "mission name")?;
    path_segment(&file_name, "file name")?;
    let voice_type: VoiceType = voice_type
        .parse()
        .map_err(|e: stride_types::UnknownVoiceType| ApiError::BadRequest(e.to_string()))?;

    let path: PathBuf = state
        .stories_dir
        .join(&mission_name)
        .join("audio")
        .join(voice_type.as_str())
        .join(&file_name);

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::NotFound(format!("audio file not found: {}", file_name)));
        }
        Err(e) => {
            return Err(ApiError::InternalServerError(format!(
                "failed to read {}: {}",
                path.display(),
                e
            )));
        }
    };

    Ok(([(header::CONTENT_TYPE, content_type(&path))], bytes).into_response())
}

fn content_type(path: &FsPath) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "ogg" => "audio/ogg",
        "flac" => "audio/flac",
        "aac" => "audio/aac",
        "m4a" => "audio/mp4",
        "webm" => "audio/webm",
        "txt" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}
