//! Retell bridge application
//!
//! Every call that reaches this application is bridged once and then left to
//! the runtime. Calls coming out of Retell go to the number they dialed; all
//! other calls are sent to Retell over its trunk with the same number. A REFER
//! from the far end is relayed as a `sip:refer` on the original leg.

use crate::config::RetellConfig;
use crate::domain::call::{ReferEvent, TransferRequest};
use crate::domain::routing::{Provenance, RoutingPolicy};
use crate::infrastructure::jambonz::{
    DialVerb, HookEvent, NewSessionRequest, Session, SessionContext, SessionError,
    SessionHandler, SipReferVerb,
};
use crate::infrastructure::metrics;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info};

pub struct RetellService {
    path: String,
    refer_hook: String,
    policy: RoutingPolicy,
}

impl RetellService {
    pub fn new(config: &RetellConfig) -> Self {
        Self {
            path: config.path.clone(),
            refer_hook: config.refer_hook.clone(),
            policy: RoutingPolicy::new(config.auth_header.clone(), config.trunk.clone()),
        }
    }

    pub fn policy(&self) -> &RoutingPolicy {
        &self.policy
    }

    fn bridge(&self, session: &mut Session, provenance: Provenance) -> Result<(), SessionError> {
        let call = session.call();
        let target = self.policy.dial_target(call, provenance)?;
        let dial = DialVerb::new(call.from.clone(), target).with_refer_hook(self.refer_hook.clone());

        session.dial(dial).hangup().send()
    }
}

#[async_trait]
impl SessionHandler for RetellService {
    fn path(&self) -> &str {
        &self.path
    }

    async fn on_session_new(&self, session: &mut Session, request: &NewSessionRequest) {
        let ctx = session.context().clone();
        let call = session.call();
        info!(
            parent: &ctx.span,
            from = %call.from,
            to = %call.to,
            direction = %call.direction,
            sip_call_id = ?request.info.call_id,
            query_args = ?request.query_args,
            "new incoming call: {}",
            ctx.call_sid
        );

        let provenance = self.policy.provenance(call);
        if provenance == Provenance::FromRetell {
            info!(parent: &ctx.span, "call {} is coming from Retell", ctx.call_sid);
        }
        metrics::record_session_routed(provenance);

        session
            .on_hook(self.refer_hook.clone(), Arc::new(on_refer))
            .on_close(Arc::new(on_close))
            .on_error(Arc::new(on_error));

        if let Err(err) = self.bridge(session, provenance) {
            error!(
                parent: &ctx.span,
                call_sid = %ctx.call_sid,
                error = %err,
                "Error responding to incoming call: {}",
                ctx.call_sid
            );
            metrics::record_session_failed(err.kind());
            session.close();
        }
    }
}

fn on_refer(session: &mut Session, event: &HookEvent) -> Result<(), SessionError> {
    let refer: ReferEvent = serde_json::from_value(event.data.clone())?;
    info!(
        parent: &session.context().span,
        refer_details = ?refer.refer_details,
        "session {} received refer",
        session.call_sid()
    );

    let transfer = TransferRequest::from_event(&refer)?;
    session
        .sip_refer(SipReferVerb::from(&transfer))
        .reply(&event.msgid)?;
    metrics::record_transfer();
    Ok(())
}

fn on_close(ctx: &SessionContext, code: Option<u16>, reason: &str) {
    info!(
        parent: &ctx.span,
        code = ?code,
        reason,
        duration_secs = ctx.elapsed().num_seconds(),
        "session {} closed",
        ctx.call_sid
    );
}

fn on_error(ctx: &SessionContext, err: &SessionError) {
    info!(parent: &ctx.span, error = %err, "session {} received error", ctx.call_sid);
}
