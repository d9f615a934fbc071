//! Call value objects

use crate::domain::shared::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Call direction as reported by the call-control runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallDirection {
    /// Call arriving at the runtime from a carrier or SIP peer
    Inbound,
    /// Call originated by the runtime
    Outbound,
}

impl fmt::Display for CallDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallDirection::Inbound => f.write_str("inbound"),
            CallDirection::Outbound => f.write_str("outbound"),
        }
    }
}

/// Session state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Between `session:new` and close/error
    Active,
    /// No further instructions are accepted
    Terminated(TerminationCause),
}

impl SessionState {
    /// Check if state transition is valid
    pub fn can_transition_to(&self, new_state: &SessionState) -> bool {
        use SessionState::*;

        match (self, new_state) {
            (Active, Terminated(_)) => true,

            // The remote close is still reported after a local close or an error
            (
                Terminated(TerminationCause::Local | TerminationCause::Error(_)),
                Terminated(TerminationCause::Closed { .. }),
            ) => true,

            _ => false,
        }
    }

    /// Move to `new_state` if the transition is allowed
    pub fn transition_to(&mut self, new_state: SessionState) -> Result<()> {
        if !self.can_transition_to(&new_state) {
            return Err(DomainError::InvalidStateTransition(format!(
                "Cannot transition from {:?} to {:?}",
                self, new_state
            )));
        }

        *self = new_state;
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        matches!(self, SessionState::Active)
    }
}

/// Reason a session left the active state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminationCause {
    /// The handler closed the session itself
    Local,
    /// The runtime closed the connection
    Closed { code: Option<u16>, reason: String },
    /// The runtime or transport reported an error
    Error(String),
}
