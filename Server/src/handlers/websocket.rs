// handlers/websocket.rs

use axum::{extract::State, Json};
use serde::Serialize;
use socketioxide::{
    extract::SocketRef, layer::SocketIoLayer, socket::DisconnectReason, SocketIo,
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::egress::websocket::BROADCAST_ROOM;
use crate::services::topic_manager::TopicManager;
use crate::types::AppState;

#[derive(Serialize, Debug)]
pub struct SimpleSocket {
    pub id: String,
    pub connected: bool,
}

#[derive(Serialize, Debug)]
pub struct SimpleSocketsResponse {
    pub sockets: Vec<SimpleSocket>,
}

#[instrument(skip_all)]
pub async fn list_sockets(State(app_state): State<AppState>) -> Json<SimpleSocketsResponse> {
    let sockets = app_state.socket_io.sockets().unwrap_or_default();
    let mut simple_sockets = Vec::<SimpleSocket>::new();
    for socket in sockets {
        simple_sockets.push(SimpleSocket {
            id: socket.id.to_string(),
            connected: socket.connected(),
        });
    }
    Json(SimpleSocketsResponse {
        sockets: simple_sockets,
    })
}

#[instrument(skip_all)]
pub fn create_websocket_router_layer(
    topic_manager: Arc<TopicManager>,
) -> (SocketIoLayer, SocketIo) {
    let (layer, io) = SocketIo::new_layer();

    // Track connections and disconnections in the "/" namespace
    let io_clone = io.clone();
    io_clone.ns("/", move |socket: SocketRef| async move {
        let socket_id = socket.id.to_string();
        debug!("Setting up websocket connection with id {:#?}", socket_id);

        let topic_manager_clone = Arc::clone(&topic_manager);
        socket.on_disconnect(move |socket: SocketRef, reason: DisconnectReason| async move {
            info!(
                "Socket {} on ns {} disconnected, reason: {:?}",
                socket.id,
                socket.ns(),
                reason
            );
            socket.leave(BROADCAST_ROOM).unwrap();
            if let Some(ws_ingress) = topic_manager_clone.get_websocket_ingress() {
                ws_ingress.remove_socket(&socket.id.to_string());
            }
        });

        // Setup websocket ingress
        if let Some(ws_ingress) = topic_manager.get_websocket_ingress() {
            ws_ingress.add_socket(socket_id.clone(), socket.clone().into());
        };

        // Setup websocket egress
        let _ = socket.join(BROADCAST_ROOM); // Join the broadcast room

        info!("Websocket connected with id: {:#?}", socket_id);
    });

    let io_clone = io.clone();
    (layer, io_clone)
}
