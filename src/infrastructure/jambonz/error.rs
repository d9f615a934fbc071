//! Session errors

use crate::domain::shared::error::DomainError;
use crate::domain::shared::value_objects::CallSid;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("session {0} is terminated")]
    Terminated(CallSid),

    #[error("connection to the call-control runtime is closed")]
    ChannelClosed,

    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("transport error: {0}")]
    Transport(String),
}

impl SessionError {
    /// Short label used for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            SessionError::Terminated(_) => "terminated",
            SessionError::ChannelClosed => "channel_closed",
            SessionError::Json(_) => "json",
            SessionError::Domain(_) => "domain",
            SessionError::Transport(_) => "transport",
        }
    }
}
