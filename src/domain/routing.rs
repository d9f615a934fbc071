//! Inbound call routing
//!
//! Decides where a new call leg goes. Calls that Retell places towards the
//! PSTN arrive authenticated and are sent on to the number they dialed; every
//! other call is handed to Retell over its trunk, keeping the dialed number.

use crate::domain::call::{CallDirection, CallSession, DialTarget};
use crate::domain::shared::error::Result;
use std::fmt;

/// Where a call came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Placed by the AI service and authenticated by the runtime
    FromRetell,
    /// Any other caller
    External,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::FromRetell => "retell",
            Provenance::External => "external",
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Routing policy for the Retell bridge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingPolicy {
    auth_header: String,
    trunk: String,
}

impl RoutingPolicy {
    pub fn new(auth_header: impl Into<String>, trunk: impl Into<String>) -> Self {
        Self {
            auth_header: auth_header.into(),
            trunk: trunk.into(),
        }
    }

    pub fn auth_header(&self) -> &str {
        &self.auth_header
    }

    pub fn trunk(&self) -> &str {
        &self.trunk
    }

    pub fn provenance(&self, call: &CallSession) -> Provenance {
        if call.direction == CallDirection::Inbound && call.sip_headers.contains(&self.auth_header)
        {
            Provenance::FromRetell
        } else {
            Provenance::External
        }
    }

    /// Build the target for the outbound leg of `call`
    pub fn dial_target(&self, call: &CallSession, provenance: Provenance) -> Result<DialTarget> {
        let target = DialTarget::phone(call.to.clone())?;
        Ok(match provenance {
            Provenance::FromRetell => target,
            Provenance::External => target.via_trunk(self.trunk.clone()),
        })
    }
}
