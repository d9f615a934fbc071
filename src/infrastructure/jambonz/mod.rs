//! jambonz call-control runtime integration
//!
//! The runtime drives each call over a WebSocket using the `ws.jambonz.org`
//! subprotocol: it reports call events and the application answers with verbs.

pub mod connection;
pub mod error;
pub mod handler;
pub mod message;
pub mod session;
pub mod verb;

pub use connection::Connection;
pub use error::SessionError;
pub use handler::{NewSessionRequest, SessionHandler};
pub use message::{CallInfo, InboundMessage, OutboundMessage, JAMBONZ_SUBPROTOCOL};
pub use session::{HookEvent, Outbound, Session, SessionContext};
pub use verb::{DialVerb, SipReferVerb, Verb};
