use axum::{
    http::Request,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing::instrument;

use crate::handlers::{config, frames, websocket};
use crate::metrics::metrics_handler;
use crate::processing::ProcessingPipeline;
use crate::services::config_store::ConfigStore;
use crate::services::topic_manager::TopicManager;
use crate::types::AppState;

#[instrument(skip_all)]
pub fn create_router(
    topic_manager: Arc<TopicManager>,
    config_store: Arc<ConfigStore>,
    processing_pipeline: Arc<ProcessingPipeline>,
) -> Router {
    // Initialize SocketIo
    let (socket_io_layer, socket_io) =
        websocket::create_websocket_router_layer(topic_manager.clone());

    let app_state = AppState {
        topic_manager: topic_manager.clone(),
        config_store,
        processing_pipeline,
        socket_io: Arc::new(socket_io),
    };

    topic_manager.set_socket_io(app_state.socket_io.clone());

    Router::new()
        // Frame endpoints
        .route("/frames/receive", post(frames::receive_frame)) // Manually insert a frame for processing
        // Threshold reconfiguration
        .route("/config", get(config::get_config))
        .route("/config/update_settings", get(config::update_settings))
        // Socket management
        .route("/sockets", get(websocket::list_sockets))
        .route("/sockets/list", get(websocket::list_sockets))
        // Metrics endpoint
        .route("/metrics", get(metrics_handler))
        // Apply middleware
        .layer(
            // We allow cross-origin requests from any origin
            CorsLayer::permissive(),
        )
        .layer(
            // Add logging middleware
            ServiceBuilder::new().layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().include_headers(true))
                    .on_request(
                        |request: &Request<axum::body::Body>, _span: &tracing::Span| {
                            #[instrument(skip_all, name = "request")]
                            fn log_request(request: &Request<axum::body::Body>) {
                                // If the path is /metrics, don't log it
                                if request.uri().path() == "/metrics" {
                                    return;
                                }

                                tracing::info!(
                                    "Received request for endpoint: {}",
                                    request.uri().path()
                                );
                            }
                            log_request(request);
                        },
                    ),
            ),
        )
        // SocketIo layer
        .layer(socket_io_layer)
        // Share state
        .with_state(app_state)
}
