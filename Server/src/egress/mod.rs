pub mod websocket;

use std::sync::Arc;
use tracing::instrument;

use crate::services::topic_manager::TopicManager;

#[instrument(skip_all)]
pub fn initialize_egress_protocols(topic_manager: Arc<TopicManager>) {
    websocket::WebSocketEgress::initialize(topic_manager);
}
