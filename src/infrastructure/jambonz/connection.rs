//! Per-connection event routing
//!
//! The runtime opens one WebSocket per call. `Connection` turns the frames it
//! receives into session events; the transport loop lives in the API layer.

use super::error::SessionError;
use super::handler::{NewSessionRequest, SessionHandler};
use super::message::{InboundMessage, OutboundMessage};
use super::session::{HookEvent, Outbound, Session};
use crate::domain::call::CallSession;
use crate::domain::shared::value_objects::MsgId;
use crate::infrastructure::metrics;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub struct Connection {
    handler: Arc<dyn SessionHandler>,
    query_args: HashMap<String, String>,
    outbound: mpsc::UnboundedSender<Outbound>,
    session: Option<Session>,
}

impl Connection {
    pub fn new(
        handler: Arc<dyn SessionHandler>,
        query_args: HashMap<String, String>,
        outbound: mpsc::UnboundedSender<Outbound>,
    ) -> Self {
        Self {
            handler,
            query_args,
            outbound,
            session: None,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Handle one text frame
    pub async fn handle_text(&mut self, text: &str) {
        match serde_json::from_str::<InboundMessage>(text) {
            Ok(message) => self.handle_message(message).await,
            Err(e) => warn!("Discarding malformed message: {}", e),
        }
    }

    pub async fn handle_message(&mut self, message: InboundMessage) {
        match message {
            InboundMessage::SessionNew {
                msgid,
                call_sid,
                data,
            } => {
                if self.session.is_some() {
                    warn!("Duplicate session:new for {} ignored", call_sid);
                    return;
                }

                let mut session =
                    Session::new(CallSession::from(&data), msgid, self.outbound.clone());
                metrics::record_session_opened();

                let request = NewSessionRequest {
                    info: data,
                    query_args: self.query_args.clone(),
                };
                self.handler.on_session_new(&mut session, &request).await;
                self.session = Some(session);
            }
            InboundMessage::VerbHook {
                msgid, hook, data, ..
            } => match self.session.as_mut() {
                Some(session) => session.dispatch_hook(HookEvent { msgid, hook, data }),
                None => {
                    warn!("verb:hook {} received before session:new", hook);
                    self.ack_without_session(msgid);
                }
            },
            InboundMessage::CallStatus { call_sid, data } => {
                debug!(call_sid = ?call_sid, status = %data, "call status");
            }
            InboundMessage::VerbStatus { data } => {
                debug!(status = %data, "verb status");
            }
            // Reported for a rejected instruction; the call itself goes on
            InboundMessage::Error { data } => match self.session.as_ref() {
                Some(session) => {
                    warn!(parent: &session.context().span, error = %data, "runtime reported an error")
                }
                None => warn!("Runtime error before session:new: {}", data),
            },
            InboundMessage::Unknown => {
                debug!("Ignoring unsupported message type");
            }
        }
    }

    /// The runtime sent a close frame or the stream ended
    pub fn handle_close(&mut self, code: Option<u16>, reason: &str) {
        match self.session.as_mut() {
            Some(session) => session.dispatch_close(code, reason),
            None => info!("Connection closed before session:new"),
        }
    }

    pub fn handle_transport_error(&mut self, error: String) {
        let err = SessionError::Transport(error);
        match self.session.as_mut() {
            Some(session) => session.dispatch_error(err),
            None => warn!("Connection failed before session:new: {}", err),
        }
    }

    /// Release the session once the transport is gone
    pub fn finish(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.dispatch_close(None, "connection dropped");
            metrics::record_session_ended();
        }
    }

    fn ack_without_session(&self, msgid: MsgId) {
        let sent = serde_json::to_string(&OutboundMessage::ack(msgid, Vec::new()))
            .map_err(SessionError::from)
            .and_then(|frame| {
                self.outbound
                    .send(Outbound::Frame(frame))
                    .map_err(|_| SessionError::ChannelClosed)
            });
        if let Err(e) = sent {
            warn!("Failed to acknowledge hook: {}", e);
        }
    }
}
