//! Application handlers

use super::message::CallInfo;
use super::session::Session;
use async_trait::async_trait;
use std::collections::HashMap;

/// Everything known when a call arrives
#[derive(Debug, Clone)]
pub struct NewSessionRequest {
    pub info: CallInfo,
    /// Query string of the WebSocket upgrade request
    pub query_args: HashMap<String, String>,
}

/// Trait for applications served on a WebSocket path
#[async_trait]
pub trait SessionHandler: Send + Sync {
    /// Path the runtime connects to
    fn path(&self) -> &str;

    /// Handle a new call. Callbacks registered on `session` stay active until
    /// the session terminates.
    async fn on_session_new(&self, session: &mut Session, request: &NewSessionRequest);
}
