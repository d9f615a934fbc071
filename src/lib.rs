//! retell-bridge - routes jambonz calls to and from a Retell voice agent
//!
//! jambonz hands each call to this service over its WebSocket API. Calls
//! placed by Retell are forwarded to the number they dialed; every other call
//! is bridged to Retell through its SIP trunk. REFERs sent by Retell during the
//! call are relayed back to the caller's leg.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interface;

// Re-export commonly used types
pub use domain::shared::error::DomainError;
pub use domain::shared::error::Result;
