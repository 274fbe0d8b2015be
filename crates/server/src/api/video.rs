//! Video transcode API handlers.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    Extension, Json,
};
use hlsmith_core::{Identity, PoolStatus, TranscodeStatus};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::ApiError;
use crate::state::AppState;

const VIDEO_KEY_REQUIRED: &str = "videoKey is required";

/// Request body for starting a transcode
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessVideoBody {
    #[serde(default)]
    pub video_key: Option<String>,
}

/// Response for an accepted transcode
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessVideoResponse {
    pub message: String,
    pub hls_key: String,
    pub video_key: String,
}

/// Query parameters for the status endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusParams {
    pub video_key: Option<String>,
}

/// Start transcoding a video into HLS. Returns once the job is accepted.
pub async fn process_video(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    body: Result<Json<ProcessVideoBody>, JsonRejection>,
) -> Result<(StatusCode, Json<ProcessVideoResponse>), ApiError> {
    let Json(body) = body.map_err(|_| ApiError::BadRequest(VIDEO_KEY_REQUIRED.to_string()))?;
    let video_key = body.video_key.unwrap_or_default();

    let started = state
        .orchestrator()
        .start_transcode(&video_key, &identity)
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(ProcessVideoResponse {
            message: "Video processing started".to_string(),
            hls_key: started.hls_key,
            video_key: started.video_key,
        }),
    ))
}

/// Current progress for a video key.
pub async fn get_status(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StatusParams>,
) -> Result<Json<TranscodeStatus>, ApiError> {
    let video_key = params
        .video_key
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest(VIDEO_KEY_REQUIRED.to_string()))?;

    Ok(Json(state.orchestrator().status(&video_key).await))
}

/// Worker pool occupancy and totals.
pub async fn get_pool(State(state): State<Arc<AppState>>) -> Json<PoolStatus> {
    Json(state.orchestrator().pool_status())
}
