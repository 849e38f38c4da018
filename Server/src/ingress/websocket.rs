use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use socketioxide::extract::{Data, SocketRef};
use tracing::instrument;

use crate::processing::ProcessingPipeline;
use crate::services::topic_manager::TopicManager;

#[derive(Debug)]
pub struct WebSocketIngress {
    sockets: RwLock<HashMap<String, Arc<SocketRef>>>,
    processing_pipeline: Arc<ProcessingPipeline>,
    topic_manager: Arc<TopicManager>,
}

impl WebSocketIngress {
    #[instrument(skip_all)]
    pub fn initialize(
        topic_manager: Arc<TopicManager>,
        processing_pipeline: Arc<ProcessingPipeline>,
    ) {
        let instance = Arc::new(Self {
            sockets: RwLock::new(HashMap::new()),
            processing_pipeline,
            topic_manager: topic_manager.clone(),
        });

        // Store the instance in the TopicManager
        topic_manager.set_websocket_ingress(instance);
    }

    /// Registers a connecting socket and wires its "frame" events into the
    /// pipeline. Each payload is one enveloped cloud frame.
    #[instrument(skip_all)]
    pub fn add_socket(&self, socket_id: String, socket: Arc<SocketRef>) {
        self.sockets.write().unwrap().insert(socket_id, socket.clone());

        let processing_pipeline = self.processing_pipeline.clone();
        let topic_manager = self.topic_manager.clone();
        socket.on("frame", move |_s: SocketRef, Data(data): Data<Vec<u8>>| {
            processing_pipeline.push_to_decoder(data, topic_manager.clone());
        });
    }

    #[instrument(skip_all)]
    pub fn remove_socket(&self, socket_id: &str) {
        self.sockets.write().unwrap().remove(socket_id);
    }
}
