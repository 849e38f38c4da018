// handlers/frames.rs

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use tracing::instrument;

use crate::types::AppState;

#[axum::debug_handler]
#[instrument(skip_all)]
pub async fn receive_frame(
    State(state): State<AppState>,
    frame_data: Bytes,
) -> Json<serde_json::Value> {
    state
        .processing_pipeline
        .push_to_decoder(frame_data.to_vec(), state.topic_manager.clone());

    Json(serde_json::json!({"status": "Frame pushed to processor"}))
}
