//! Route handler functions.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::info;

use doki_core::types::{Conversation, GenerationRequest, GenerationResult};

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Request / response types
// =============================================================================

/// Body of `POST /generate`. Fields are optional here so that missing
/// values surface as validation errors rather than JSON rejections.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateBody {
    pub text: Option<String>,
    pub user_id: Option<String>,
    /// Base64-encoded image.
    pub image_data: Option<String>,
}

impl GenerateBody {
    /// Convert to a pipeline request, decoding the image. An empty
    /// `imageData` string counts as no image.
    pub fn into_request(self) -> Result<GenerationRequest, ApiError> {
        let mut request = GenerationRequest::new(
            self.user_id.unwrap_or_default(),
            self.text.unwrap_or_default(),
        );

        if let Some(encoded) = self.image_data.filter(|s| !s.trim().is_empty()) {
            let bytes = BASE64_STANDARD
                .decode(encoded.trim())
                .map_err(|e| ApiError::BadRequest(format!("imageData is not valid base64: {e}")))?;
            request = request.with_image(bytes);
        }

        Ok(request)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /generate - run one conversational turn.
pub async fn generate(
    State(state): State<AppState>,
    body: Result<Json<GenerateBody>, JsonRejection>,
) -> Result<Json<GenerationResult>, ApiError> {
    let Json(body) = body?;
    let request = body.into_request()?;
    let result = state.orchestrator.handle(request).await?;
    Ok(Json(result))
}

/// GET /conversations/{user_id} - stored history, empty for unknown users.
pub async fn get_conversation(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Conversation>, ApiError> {
    if user_id.trim().is_empty() {
        return Err(ApiError::BadRequest("user id is required".to_string()));
    }
    let history = state.store().load(&user_id).await;
    Ok(Json(Conversation::new(user_id, history)))
}

/// DELETE /conversations/{user_id}
pub async fn delete_conversation(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if user_id.trim().is_empty() {
        return Err(ApiError::BadRequest("user id is required".to_string()));
    }
    state.store().clear(&user_id).await;
    info!(%user_id, "Conversation cleared");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}
