//! Session handle
//!
//! A `Session` is owned by the task serving one runtime connection. Handlers
//! register callbacks on it and queue verbs; `send`/`reply` flush the queue as
//! a single message. Frames leave through an unbounded channel drained by the
//! connection's writer task, so none of these calls block.

use super::error::SessionError;
use super::message::OutboundMessage;
use super::verb::{DialVerb, SipReferVerb, Verb};
use crate::domain::call::{CallSession, SessionState, TerminationCause};
use crate::domain::shared::value_objects::{CallSid, MsgId};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info_span, warn, Span};

/// Item handed to the connection writer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Serialized message
    Frame(String),
    /// Close the connection
    Close,
}

/// A `verb:hook` callback from the runtime
#[derive(Debug, Clone)]
pub struct HookEvent {
    pub msgid: MsgId,
    pub hook: String,
    pub data: Value,
}

pub type HookCallback =
    Arc<dyn Fn(&mut Session, &HookEvent) -> Result<(), SessionError> + Send + Sync>;
pub type CloseCallback = Arc<dyn Fn(&SessionContext, Option<u16>, &str) + Send + Sync>;
pub type ErrorCallback = Arc<dyn Fn(&SessionContext, &SessionError) + Send + Sync>;

#[derive(Default, Clone)]
struct Callbacks {
    hooks: HashMap<String, HookCallback>,
    close: Option<CloseCallback>,
    error: Option<ErrorCallback>,
}

/// Per-session context handed to every callback
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub call_sid: CallSid,
    /// Span carrying `call_sid`; parent of all session logs
    pub span: Span,
    pub started_at: DateTime<Utc>,
}

impl SessionContext {
    pub fn new(call_sid: CallSid) -> Self {
        let span = info_span!("session", call_sid = %call_sid);
        Self {
            call_sid,
            span,
            started_at: Utc::now(),
        }
    }

    pub fn elapsed(&self) -> chrono::Duration {
        Utc::now() - self.started_at
    }
}

pub struct Session {
    call: CallSession,
    context: SessionContext,
    state: SessionState,
    /// `session:new` message still waiting for its ack
    new_session_msgid: Option<MsgId>,
    pending: Vec<Verb>,
    callbacks: Callbacks,
    outbound: mpsc::UnboundedSender<Outbound>,
}

impl Session {
    pub fn new(call: CallSession, msgid: MsgId, outbound: mpsc::UnboundedSender<Outbound>) -> Self {
        let context = SessionContext::new(call.call_sid.clone());
        Self {
            call,
            context,
            state: SessionState::Active,
            new_session_msgid: Some(msgid),
            pending: Vec::new(),
            callbacks: Callbacks::default(),
            outbound,
        }
    }

    pub fn call(&self) -> &CallSession {
        &self.call
    }

    pub fn call_sid(&self) -> &CallSid {
        &self.call.call_sid
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Verbs queued since the last flush
    pub fn pending(&self) -> &[Verb] {
        &self.pending
    }

    pub fn has_hook(&self, hook: &str) -> bool {
        self.callbacks.hooks.contains_key(hook)
    }

    pub fn has_close_handler(&self) -> bool {
        self.callbacks.close.is_some()
    }

    pub fn has_error_handler(&self) -> bool {
        self.callbacks.error.is_some()
    }

    // Callback registration

    pub fn on_hook(&mut self, hook: impl Into<String>, callback: HookCallback) -> &mut Self {
        self.callbacks.hooks.insert(hook.into(), callback);
        self
    }

    pub fn on_close(&mut self, callback: CloseCallback) -> &mut Self {
        self.callbacks.close = Some(callback);
        self
    }

    pub fn on_error(&mut self, callback: ErrorCallback) -> &mut Self {
        self.callbacks.error = Some(callback);
        self
    }

    // Instructions

    pub fn dial(&mut self, verb: DialVerb) -> &mut Self {
        self.pending.push(Verb::Dial(verb));
        self
    }

    pub fn hangup(&mut self) -> &mut Self {
        self.pending.push(Verb::Hangup);
        self
    }

    pub fn sip_refer(&mut self, verb: SipReferVerb) -> &mut Self {
        self.pending.push(Verb::SipRefer(verb));
        self
    }

    /// Flush queued verbs as the call's instruction set.
    ///
    /// The first send acknowledges `session:new`; later sends redirect the call.
    pub fn send(&mut self) -> Result<(), SessionError> {
        self.ensure_active()?;
        let verbs = std::mem::take(&mut self.pending);
        let message = match self.new_session_msgid.take() {
            Some(msgid) => OutboundMessage::ack(msgid, verbs),
            None => OutboundMessage::redirect(verbs),
        };
        self.transmit(&message)
    }

    /// Acknowledge `msgid` with the queued verbs
    pub fn reply(&mut self, msgid: &MsgId) -> Result<(), SessionError> {
        self.ensure_active()?;
        let verbs = std::mem::take(&mut self.pending);
        self.transmit(&OutboundMessage::ack(msgid.clone(), verbs))
    }

    /// Terminate the session and close the connection
    pub fn close(&mut self) {
        if self
            .state
            .transition_to(SessionState::Terminated(TerminationCause::Local))
            .is_err()
        {
            return;
        }
        self.pending.clear();
        debug!(parent: &self.context.span, "closing session");
        // The writer may already be gone with the connection
        let _ = self.outbound.send(Outbound::Close);
    }

    fn ensure_active(&mut self) -> Result<(), SessionError> {
        if self.is_active() {
            Ok(())
        } else {
            self.pending.clear();
            Err(SessionError::Terminated(self.call.call_sid.clone()))
        }
    }

    fn transmit(&self, message: &OutboundMessage) -> Result<(), SessionError> {
        let frame = serde_json::to_string(message)?;
        self.outbound
            .send(Outbound::Frame(frame))
            .map_err(|_| SessionError::ChannelClosed)
    }

    // Event dispatch

    /// Run the callback registered for `event.hook`.
    ///
    /// A missing callback, a failing one, or a terminated session is answered
    /// with an empty ack so the runtime is not left waiting.
    pub fn dispatch_hook(&mut self, event: HookEvent) {
        if !self.is_active() {
            debug!(parent: &self.context.span, hook = %event.hook, "hook on terminated session");
            self.ack_empty(&event.msgid);
            return;
        }

        let callback = self.callbacks.hooks.get(&event.hook).cloned();
        let Some(callback) = callback else {
            warn!(parent: &self.context.span, hook = %event.hook, "no handler registered for hook");
            self.ack_empty(&event.msgid);
            return;
        };

        if let Err(err) = callback(self, &event) {
            error!(
                parent: &self.context.span,
                call_sid = %self.call.call_sid,
                hook = %event.hook,
                error = %err,
                "hook handler failed"
            );
            self.ack_empty(&event.msgid);
        }
    }

    /// Handle the runtime closing the connection
    pub fn dispatch_close(&mut self, code: Option<u16>, reason: &str) {
        let next = SessionState::Terminated(TerminationCause::Closed {
            code,
            reason: reason.to_string(),
        });
        if let Err(err) = self.state.transition_to(next) {
            debug!(parent: &self.context.span, error = %err, "session already closed");
            return;
        }
        self.pending.clear();

        if let Some(callback) = self.callbacks.close.clone() {
            callback(&self.context, code, reason);
        }
    }

    /// Handle an error reported by the runtime or the transport
    pub fn dispatch_error(&mut self, err: SessionError) {
        let next = SessionState::Terminated(TerminationCause::Error(err.to_string()));
        if self.state.transition_to(next).is_err() {
            debug!(parent: &self.context.span, error = %err, "error after session terminated");
            return;
        }
        self.pending.clear();

        if let Some(callback) = self.callbacks.error.clone() {
            callback(&self.context, &err);
        }
    }

    /// Empty ack, sent even when the session is no longer active
    fn ack_empty(&mut self, msgid: &MsgId) {
        self.pending.clear();
        if let Err(err) = self.transmit(&OutboundMessage::ack(msgid.clone(), Vec::new())) {
            warn!(parent: &self.context.span, error = %err, "failed to acknowledge hook");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::call::{CallDirection, DialTarget};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn new_session() -> (Session, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let call = CallSession::new(CallSid::new("sid-1"), "+1555000", "+1555999", CallDirection::Inbound);
        (Session::new(call, MsgId::new("new-1"), tx), rx)
    }

    fn frame(rx: &mut mpsc::UnboundedReceiver<Outbound>) -> Value {
        match rx.try_recv().unwrap() {
            Outbound::Frame(text) => serde_json::from_str(&text).unwrap(),
            Outbound::Close => panic!("expected a frame, got close"),
        }
    }

    fn dial() -> DialVerb {
        DialVerb::new("+1555000", DialTarget::phone("+1555999").unwrap())
    }

    #[test]
    fn test_first_send_acks_session_new() {
        let (mut session, mut rx) = new_session();
        session.dial(dial()).hangup().send().unwrap();

        let message = frame(&mut rx);
        assert_eq!(message["type"], "ack");
        assert_eq!(message["msgid"], "new-1");
        assert_eq!(message["data"][0]["verb"], "dial");
        assert_eq!(message["data"][1]["verb"], "hangup");
        assert!(session.pending().is_empty());
    }

    #[test]
    fn test_second_send_redirects() {
        let (mut session, mut rx) = new_session();
        session.hangup().send().unwrap();
        let _ = frame(&mut rx);

        session.hangup().send().unwrap();
        let message = frame(&mut rx);
        assert_eq!(message["type"], "command");
        assert_eq!(message["command"], "redirect");
    }

    #[test]
    fn test_send_after_close_fails() {
        let (mut session, mut rx) = new_session();
        session.close();
        assert_eq!(rx.try_recv().unwrap(), Outbound::Close);
        assert_eq!(
            session.state(),
            &SessionState::Terminated(TerminationCause::Local)
        );

        let result = session.hangup().send();
        assert!(matches!(result, Err(SessionError::Terminated(_))));
        assert!(session.pending().is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_send_on_dropped_connection_fails() {
        let (mut session, rx) = new_session();
        drop(rx);
        assert!(matches!(
            session.hangup().send(),
            Err(SessionError::ChannelClosed)
        ));
    }

    #[test]
    fn test_hook_dispatch() {
        let (mut session, mut rx) = new_session();
        session.on_hook(
            "/refer",
            Arc::new(|session: &mut Session, event: &HookEvent| {
                session
                    .sip_refer(SipReferVerb {
                        refer_to: event.data["user"].as_str().unwrap_or_default().to_string(),
                        referred_by: None,
                    })
                    .reply(&event.msgid)
            }),
        );

        session.dispatch_hook(HookEvent {
            msgid: MsgId::new("hook-1"),
            hook: "/refer".to_string(),
            data: json!({"user": "bob"}),
        });

        let message = frame(&mut rx);
        assert_eq!(message["msgid"], "hook-1");
        assert_eq!(message["data"][0]["verb"], "sip:refer");
        assert_eq!(message["data"][0]["referTo"], "bob");
    }

    #[test]
    fn test_unregistered_or_failing_hook_is_acked_empty() {
        let (mut session, mut rx) = new_session();
        session.dispatch_hook(HookEvent {
            msgid: MsgId::new("hook-1"),
            hook: "/unknown".to_string(),
            data: Value::Null,
        });
        assert_eq!(frame(&mut rx), json!({"type": "ack", "msgid": "hook-1"}));

        session.on_hook(
            "/fails",
            Arc::new(|session: &mut Session, _event: &HookEvent| -> Result<(), SessionError> {
                session.hangup();
                Err(SessionError::Transport("nope".to_string()))
            }),
        );
        session.dispatch_hook(HookEvent {
            msgid: MsgId::new("hook-2"),
            hook: "/fails".to_string(),
            data: Value::Null,
        });
        assert_eq!(frame(&mut rx), json!({"type": "ack", "msgid": "hook-2"}));
        assert!(session.is_active());
    }

    #[test]
    fn test_close_and_error_run_once() {
        let closes = Arc::new(AtomicUsize::new(0));
        let errors = Arc::new(AtomicUsize::new(0));

        let (mut session, mut rx) = new_session();
        let close_count = closes.clone();
        let error_count = errors.clone();
        session
            .on_close(Arc::new(move |_ctx: &SessionContext, code: Option<u16>, _reason: &str| {
                assert_eq!(code, Some(1000));
                close_count.fetch_add(1, Ordering::SeqCst);
            }))
            .on_error(Arc::new(move |_ctx: &SessionContext, _err: &SessionError| {
                error_count.fetch_add(1, Ordering::SeqCst);
            }));

        session.dispatch_close(Some(1000), "normal");
        session.dispatch_close(Some(1000), "normal");
        session.dispatch_error(SessionError::Transport("reset".to_string()));

        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert_eq!(errors.load(Ordering::SeqCst), 0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_hook_on_terminated_session_is_acked_empty() {
        let (mut session, mut rx) = new_session();
        session.on_hook(
            "/refer",
            Arc::new(|session: &mut Session, event: &HookEvent| session.hangup().reply(&event.msgid)),
        );
        session.dispatch_error(SessionError::Transport("reset".to_string()));

        session.dispatch_hook(HookEvent {
            msgid: MsgId::new("hook-1"),
            hook: "/refer".to_string(),
            data: json!({"user": "bob"}),
        });

        assert_eq!(frame(&mut rx), json!({"type": "ack", "msgid": "hook-1"}));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_close_after_transport_error_runs_close_callback() {
        let closes = Arc::new(AtomicUsize::new(0));
        let errors = Arc::new(AtomicUsize::new(0));

        let (mut session, _rx) = new_session();
        let close_count = closes.clone();
        let error_count = errors.clone();
        session
            .on_close(Arc::new(move |_ctx: &SessionContext, _code: Option<u16>, _reason: &str| {
                close_count.fetch_add(1, Ordering::SeqCst);
            }))
            .on_error(Arc::new(move |_ctx: &SessionContext, _err: &SessionError| {
                error_count.fetch_add(1, Ordering::SeqCst);
            }));

        session.dispatch_error(SessionError::Transport("reset".to_string()));
        session.dispatch_close(Some(1000), "normal");
        session.dispatch_close(Some(1000), "normal");

        assert_eq!(errors.load(Ordering::SeqCst), 1);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert!(matches!(
            session.state(),
            SessionState::Terminated(TerminationCause::Closed { code: Some(1000), .. })
        ));
    }

    #[test]
    fn test_remote_close_after_local_close() {
        let closes = Arc::new(AtomicUsize::new(0));
        let (mut session, _rx) = new_session();
        let close_count = closes.clone();
        session.on_close(Arc::new(move |_ctx: &SessionContext, _code: Option<u16>, _reason: &str| {
            close_count.fetch_add(1, Ordering::SeqCst);
        }));

        session.close();
        session.dispatch_close(Some(1000), "");

        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert!(matches!(
            session.state(),
            SessionState::Terminated(TerminationCause::Closed { .. })
        ));
    }
}
