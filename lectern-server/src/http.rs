// HTTP routes for voice listing, document upload and text reading

use crate::conversion::{ConversionError, ConversionOrchestrator, UploadRequest, UploadedFile};
use axum::{
    extract::{
        multipart::{Multipart, MultipartRejection},
        rejection::JsonRejection,
        DefaultBodyLimit, State,
    },
    http::header,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use lectern_spk::{AudioArtifact, SlotName};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, error};

/// Shared state for all handlers
#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: Arc<ConversionOrchestrator>,
    /// Request body cap, applied to uploads and JSON bodies alike
    pub max_upload_bytes: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Body of the text reading endpoints
#[derive(Debug, Default, Deserialize)]
pub struct TextRequest {
    pub text: Option<String>,
    pub voice_id: Option<String>,
}

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/get_voices", get(get_voices_handler))
        .route("/upload", post(upload_handler))
        .route("/download_audio", get(download_audio_handler))
        .route("/read_text_aloud", post(read_text_aloud_handler))
        .route("/read_paragraph", post(read_paragraph_handler))
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Log server-side failures with their details before the client sees a
/// generic message.
fn log_failure(endpoint: &str, err: &ConversionError) {
    if err.status_code().is_server_error() {
        error!(endpoint, "Request failed: {}", err);
    } else {
        debug!(endpoint, "Request rejected: {}", err);
    }
}

fn json_error(endpoint: &str, err: ConversionError) -> Response {
    log_failure(endpoint, &err);
    (err.status_code(), Json(ErrorResponse { error: err.public_message() })).into_response()
}

// The paragraph endpoint answers errors in plain text
fn plain_error(endpoint: &str, err: ConversionError) -> Response {
    log_failure(endpoint, &err);
    (err.status_code(), err.public_message()).into_response()
}

fn audio_response(artifact: AudioArtifact) -> Response {
    (
        [
            (header::CONTENT_TYPE, "audio/mpeg".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", artifact.slot.file_name()),
            ),
        ],
        artifact.bytes,
    )
        .into_response()
}

async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn get_voices_handler(State(state): State<ApiState>) -> Response {
    match state.orchestrator.voices().await {
        Ok(voices) => Json(voices).into_response(),
        Err(e) => json_error("get_voices", e),
    }
}

async fn upload_handler(State(state): State<ApiState>, multipart: Result<Multipart, MultipartRejection>) -> Response {
    // A body that is not multipart carries neither part
    let request = match multipart {
        Ok(multipart) => match read_upload(multipart).await {
            Ok(request) => request,
            Err(response) => return response,
        },
        Err(_) => UploadRequest::default(),
    };

    match state.orchestrator.upload_convert(request).await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => json_error("upload", e),
    }
}

/// Collect the `file` and `voice_id` parts. The first occurrence of each wins;
/// a `file` part without a file name is not a file.
async fn read_upload(mut multipart: Multipart) -> Result<UploadRequest, Response> {
    let mut request = UploadRequest::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                debug!("Malformed multipart body: {}", e);
                return Err((e.status(), Json(ErrorResponse { error: e.body_text() })).into_response());
            }
        };

        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);

        match (name.as_str(), file_name) {
            ("file", Some(file_name)) if request.file.is_none() => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| (e.status(), Json(ErrorResponse { error: e.body_text() })).into_response())?;
                request.file = Some(UploadedFile { file_name, bytes });
            }
            ("voice_id", _) if request.voice_id.is_none() => {
                let voice_id = field
                    .text()
                    .await
                    .map_err(|e| (e.status(), Json(ErrorResponse { error: e.body_text() })).into_response())?;
                request.voice_id = Some(voice_id);
            }
            _ => {}
        }
    }

    Ok(request)
}

async fn download_audio_handler(State(state): State<ApiState>) -> Response {
    match state.orchestrator.fetch_audio(SlotName::Upload).await {
        Ok(artifact) => audio_response(artifact),
        Err(e) => json_error("download_audio", e),
    }
}

async fn read_text_aloud_handler(
    State(state): State<ApiState>,
    body: Result<Json<TextRequest>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return (rejection.status(), Json(ErrorResponse { error: rejection.body_text() })).into_response()
        }
    };

    match state
        .orchestrator
        .text_convert(body.text.as_deref(), body.voice_id.as_deref(), SlotName::Text)
        .await
    {
        Ok(artifact) => audio_response(artifact),
        Err(e) => json_error("read_text_aloud", e),
    }
}

async fn read_paragraph_handler(
    State(state): State<ApiState>,
    body: Result<Json<TextRequest>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return (rejection.status(), rejection.body_text()).into_response(),
    };

    match state
        .orchestrator
        .text_convert(body.text.as_deref(), body.voice_id.as_deref(), SlotName::Paragraph)
        .await
    {
        Ok(artifact) => audio_response(artifact),
        Err(e) => plain_error("read_paragraph", e),
    }
}
