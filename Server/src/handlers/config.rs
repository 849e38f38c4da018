// handlers/config.rs

use axum::extract::{Json, Query, State};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::types::AppState;

#[derive(Serialize, Deserialize, Debug)]
pub struct UpdateSettingsRequest {
    pub intensity_threshold: f64,
}

#[derive(Serialize, Debug)]
pub struct ConfigResponse {
    pub intensity_threshold: f64,
}

/// Applies a new intensity threshold and echoes it back unchanged. No
/// clamping or validation: a negative or non-finite value simply lets more
/// or fewer points through on subsequent frames.
#[instrument(skip_all)]
pub async fn update_settings(
    Query(request): Query<UpdateSettingsRequest>,
    State(state): State<AppState>,
) -> Json<ConfigResponse> {
    state
        .config_store
        .set_intensity_threshold(request.intensity_threshold);
    info!("Threshold updated: {}", request.intensity_threshold);

    Json(ConfigResponse {
        intensity_threshold: request.intensity_threshold,
    })
}

#[instrument(skip_all)]
pub async fn get_config(State(state): State<AppState>) -> Json<ConfigResponse> {
    Json(ConfigResponse {
        intensity_threshold: state.config_store.intensity_threshold(),
    })
}
