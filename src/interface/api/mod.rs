//! HTTP and WebSocket API

pub mod health;
pub mod metrics_handler;
pub mod router;
pub mod ws_handler;

use crate::infrastructure::jambonz::SessionHandler;
use std::sync::Arc;

pub use metrics_handler::init_metrics;
pub use router::build_router;

/// Shared state of the API routes
#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<dyn SessionHandler>,
}
