//! jambonz verbs issued by this bridge

use crate::domain::call::{DialTarget, TransferRequest};
use serde::{Deserialize, Serialize};

/// A single call-control instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verb")]
pub enum Verb {
    #[serde(rename = "dial")]
    Dial(DialVerb),
    #[serde(rename = "hangup")]
    Hangup,
    #[serde(rename = "sip:refer")]
    SipRefer(SipReferVerb),
}

/// Bridge the current call to a new outbound leg
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialVerb {
    pub caller_id: String,
    pub answer_on_bridge: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refer_hook: Option<String>,
    pub target: Vec<DialTarget>,
}

impl DialVerb {
    /// Dial `target`, holding the inbound leg unanswered until the far end answers
    pub fn new(caller_id: impl Into<String>, target: DialTarget) -> Self {
        Self {
            caller_id: caller_id.into(),
            answer_on_bridge: true,
            refer_hook: None,
            target: vec![target],
        }
    }

    pub fn with_refer_hook(mut self, hook: impl Into<String>) -> Self {
        self.refer_hook = Some(hook.into());
        self
    }
}

/// Ask the far end to transfer the call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SipReferVerb {
    pub refer_to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referred_by: Option<String>,
}

impl From<&TransferRequest> for SipReferVerb {
    fn from(transfer: &TransferRequest) -> Self {
        Self {
            refer_to: transfer.refer_to.clone(),
            referred_by: transfer.referred_by.clone(),
        }
    }
}
