//! Transfer (REFER) requests

use crate::domain::shared::error::{DomainError, Result};
use serde::{Deserialize, Serialize};

/// Details of a REFER received on the bridged leg
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferDetails {
    #[serde(default)]
    pub refer_to_user: Option<String>,
    #[serde(default)]
    pub sip_refer_to: Option<String>,
    #[serde(default)]
    pub referred_by: Option<String>,
    #[serde(default)]
    pub referring_call_sid: Option<String>,
    #[serde(default)]
    pub referred_call_sid: Option<String>,
}

/// Payload of the refer hook
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReferEvent {
    #[serde(default)]
    pub refer_details: Option<ReferDetails>,
    #[serde(default)]
    pub to: Option<String>,
}

/// A request to move the call to a new destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub refer_to: String,
    pub referred_by: Option<String>,
}

impl TransferRequest {
    /// Extract the transfer from a refer hook event.
    ///
    /// The destination is taken verbatim from `refer_to_user`; the referrer is
    /// the `to` of the event.
    pub fn from_event(event: &ReferEvent) -> Result<Self> {
        let details = event.refer_details.as_ref().ok_or_else(|| {
            DomainError::ValidationError("refer event has no refer_details".to_string())
        })?;

        let refer_to = details
            .refer_to_user
            .as_deref()
            .filter(|user| !user.is_empty())
            .ok_or_else(|| {
                DomainError::ValidationError("refer_details has no refer_to_user".to_string())
            })?;

        Ok(Self {
            refer_to: refer_to.to_string(),
            referred_by: event.to.clone(),
        })
    }
}
