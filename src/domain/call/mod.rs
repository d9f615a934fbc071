//! Call bounded context - the sessions this bridge routes

pub mod dial;
pub mod session;
pub mod transfer;
pub mod value_object;

pub use dial::{DialTarget, TargetType};
pub use session::{CallSession, SipHeaders};
pub use transfer::{ReferDetails, ReferEvent, TransferRequest};
pub use value_object::{CallDirection, SessionState, TerminationCause};
