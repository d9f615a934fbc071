//! Interface layer - HTTP routes and the runtime WebSocket endpoint

pub mod api;
