use socketioxide::SocketIo;
use std::sync::{Arc, RwLock};
use tracing::instrument;

use crate::egress::websocket::WebSocketEgress;
use crate::ingress::websocket::WebSocketIngress;

/// Registry of the singleton transport endpoints the pipeline talks to.
#[derive(Debug)]
pub struct TopicManager {
    // Reference to the socket.io instance
    pub socket_io: RwLock<Option<Arc<SocketIo>>>,
    // Egress protocol singleton
    pub websocket_egress: RwLock<Option<Arc<WebSocketEgress>>>,
    // Ingress protocol singleton
    pub websocket_ingress: RwLock<Option<Arc<WebSocketIngress>>>,
}

impl TopicManager {
    #[instrument(skip_all)]
    pub fn new() -> Self {
        Self {
            socket_io: RwLock::new(None),
            websocket_egress: RwLock::new(None),
            websocket_ingress: RwLock::new(None),
        }
    }

    #[instrument(skip_all)]
    pub fn set_socket_io(&self, socket_io: Arc<SocketIo>) {
        *self.socket_io.write().unwrap() = Some(socket_io);
    }

    #[instrument(skip_all)]
    pub fn get_socket_io(&self) -> Option<Arc<SocketIo>> {
        self.socket_io.read().unwrap().clone()
    }

    #[instrument(skip_all)]
    pub fn set_websocket_egress(&self, egress: Arc<WebSocketEgress>) {
        *self.websocket_egress.write().unwrap() = Some(egress);
    }

    #[instrument(skip_all)]
    pub fn get_websocket_egress(&self) -> Option<Arc<WebSocketEgress>> {
        self.websocket_egress.read().unwrap().clone()
    }

    pub fn set_websocket_ingress(&self, ingress: Arc<WebSocketIngress>) {
        *self.websocket_ingress.write().unwrap() = Some(ingress);
    }

    #[instrument(skip_all)]
    pub fn get_websocket_ingress(&self) -> Option<Arc<WebSocketIngress>> {
        self.websocket_ingress.read().unwrap().clone()
    }
}
