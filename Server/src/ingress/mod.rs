pub mod websocket;

use std::sync::Arc;
use tracing::instrument;

use crate::processing::ProcessingPipeline;
use crate::services::topic_manager::TopicManager;

#[instrument(skip_all)]
pub fn initialize_ingress_protocols(
    topic_manager: Arc<TopicManager>,
    processing_pipeline: Arc<ProcessingPipeline>,
) {
    websocket::WebSocketIngress::initialize(topic_manager, processing_pipeline);
}
