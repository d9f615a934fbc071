//! jambonz WebSocket API messages

use super::verb::Verb;
use crate::domain::call::{CallDirection, CallSession, SipHeaders};
use crate::domain::shared::value_objects::{CallSid, MsgId};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// WebSocket subprotocol spoken by the runtime
pub const JAMBONZ_SUBPROTOCOL: &str = "ws.jambonz.org";

/// Messages received from the runtime
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum InboundMessage {
    #[serde(rename = "session:new")]
    SessionNew {
        msgid: MsgId,
        call_sid: CallSid,
        data: CallInfo,
    },
    #[serde(rename = "verb:hook")]
    VerbHook {
        msgid: MsgId,
        #[serde(default)]
        call_sid: Option<CallSid>,
        hook: String,
        #[serde(default)]
        data: Value,
    },
    #[serde(rename = "call:status")]
    CallStatus {
        #[serde(default)]
        call_sid: Option<CallSid>,
        #[serde(default)]
        data: Value,
    },
    #[serde(rename = "verb:status")]
    VerbStatus {
        #[serde(default)]
        data: Value,
    },
    #[serde(rename = "jambonz:error")]
    Error {
        #[serde(default)]
        data: Value,
    },
    #[serde(other)]
    Unknown,
}

/// Call details carried by `session:new`
#[derive(Debug, Clone, Deserialize)]
pub struct CallInfo {
    pub call_sid: CallSid,
    pub direction: CallDirection,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub call_id: Option<String>,
    #[serde(default)]
    pub caller_name: Option<String>,
    #[serde(default)]
    pub account_sid: Option<String>,
    #[serde(default)]
    pub application_sid: Option<String>,
    #[serde(default)]
    pub sip: Option<SipInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SipInfo {
    #[serde(default, deserialize_with = "deserialize_headers")]
    pub headers: SipHeaders,
}

/// Header values are normally strings; anything else is kept as its JSON text.
fn deserialize_headers<'de, D>(deserializer: D) -> Result<SipHeaders, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<HashMap<String, Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(name, value)| {
            let value = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            (name, value)
        })
        .collect())
}

impl From<&CallInfo> for CallSession {
    fn from(info: &CallInfo) -> Self {
        let headers = info
            .sip
            .as_ref()
            .map(|sip| sip.headers.clone())
            .unwrap_or_default();

        CallSession::new(
            info.call_sid.clone(),
            info.from.clone(),
            info.to.clone(),
            info.direction,
        )
        .with_headers(headers)
    }
}

/// Messages sent to the runtime
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutboundMessage {
    Ack {
        msgid: MsgId,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        data: Vec<Verb>,
    },
    Command {
        command: Command,
        #[serde(rename = "queueCommand")]
        queue_command: bool,
        data: Vec<Verb>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Command {
    Redirect,
}

impl OutboundMessage {
    pub fn ack(msgid: MsgId, data: Vec<Verb>) -> Self {
        OutboundMessage::Ack { msgid, data }
    }

    /// Replace whatever the call is currently executing with `data`
    pub fn redirect(data: Vec<Verb>) -> Self {
        OutboundMessage::Command {
            command: Command::Redirect,
            queue_command: false,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_session_new() {
        let raw = json!({
            "type": "session:new",
            "msgid": "abc123",
            "call_sid": "sid-1",
            "data": {
                "call_sid": "sid-1",
                "direction": "inbound",
                "from": "+15550001111",
                "to": "+15550002222",
                "call_id": "a84b4c76e66710@pc33.example",
                "sip": {
                    "headers": {
                        "X-Authenticated-User": "retell",
                        "Max-Forwards": 70
                    }
                }
            }
        });

        let message: InboundMessage = serde_json::from_value(raw).unwrap();
        let InboundMessage::SessionNew { msgid, data, .. } = message else {
            panic!("expected session:new");
        };
        assert_eq!(msgid.as_str(), "abc123");

        let session = CallSession::from(&data);
        assert_eq!(session.direction, CallDirection::Inbound);
        assert_eq!(session.to, "+15550002222");
        assert_eq!(session.sip_headers.get("x-authenticated-user"), Some("retell"));
        assert_eq!(session.sip_headers.get("Max-Forwards"), Some("70"));
    }

    #[test]
    fn test_parse_session_new_without_sip() {
        let raw = json!({
            "type": "session:new",
            "msgid": "m1",
            "call_sid": "sid-2",
            "data": {"call_sid": "sid-2", "direction": "outbound", "from": "a", "to": "b"}
        });

        let message: InboundMessage = serde_json::from_value(raw).unwrap();
        let InboundMessage::SessionNew { data, .. } = message else {
            panic!("expected session:new");
        };
        assert!(CallSession::from(&data).sip_headers.is_empty());
    }

    #[test]
    fn test_parse_other_messages() {
        let hook: InboundMessage = serde_json::from_value(json!({
            "type": "verb:hook",
            "msgid": "m2",
            "call_sid": "sid-1",
            "hook": "/refer",
            "data": {"to": "alice"}
        }))
        .unwrap();
        assert!(matches!(hook, InboundMessage::VerbHook { ref hook, .. } if hook == "/refer"));

        let unknown: InboundMessage =
            serde_json::from_value(json!({"type": "session:reconnect", "msgid": "m3"})).unwrap();
        assert!(matches!(unknown, InboundMessage::Unknown));
    }

    #[test]
    fn test_outbound_wire_format() {
        let ack = OutboundMessage::ack(MsgId::new("m1"), vec![Verb::Hangup]);
        assert_eq!(
            serde_json::to_value(&ack).unwrap(),
            json!({"type": "ack", "msgid": "m1", "data": [{"verb": "hangup"}]})
        );

        let empty = OutboundMessage::ack(MsgId::new("m2"), Vec::new());
        assert_eq!(
            serde_json::to_value(&empty).unwrap(),
            json!({"type": "ack", "msgid": "m2"})
        );

        let redirect = OutboundMessage::redirect(vec![Verb::Hangup]);
        assert_eq!(
            serde_json::to_value(&redirect).unwrap(),
            json!({
                "type": "command",
                "command": "redirect",
                "queueCommand": false,
                "data": [{"verb": "hangup"}]
            })
        );
    }
}
