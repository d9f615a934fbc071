//! Call session metadata

use crate::domain::call::value_object::CallDirection;
use crate::domain::shared::value_objects::CallSid;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// SIP headers of the leg that created the session.
///
/// Header names are matched case-insensitively, as SIP requires.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SipHeaders(HashMap<String, String>);

impl SipHeaders {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// True when the header exists with a non-empty value
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some_and(|value| !value.trim().is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for SipHeaders {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One active call leg set, as described by the runtime on `session:new`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSession {
    pub call_sid: CallSid,
    pub from: String,
    pub to: String,
    pub direction: CallDirection,
    pub sip_headers: SipHeaders,
}

impl CallSession {
    pub fn new(
        call_sid: CallSid,
        from: impl Into<String>,
        to: impl Into<String>,
        direction: CallDirection,
    ) -> Self {
        Self {
            call_sid,
            from: from.into(),
            to: to.into(),
            direction,
            sip_headers: SipHeaders::default(),
        }
    }

    pub fn with_headers(mut self, headers: SipHeaders) -> Self {
        self.sip_headers = headers;
        self
    }
}
