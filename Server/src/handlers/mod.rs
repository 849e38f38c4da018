pub mod config;
pub mod frames;
pub mod websocket;
