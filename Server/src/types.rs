use std::sync::Arc;

use crate::processing::ProcessingPipeline;
use crate::services::config_store::ConfigStore;
use crate::services::topic_manager::TopicManager;

#[derive(Clone, Debug)]
pub struct AppState {
    pub topic_manager: Arc<TopicManager>,
    pub config_store: Arc<ConfigStore>,
    pub processing_pipeline: Arc<ProcessingPipeline>,
    pub socket_io: Arc<socketioxide::SocketIo>,
}
