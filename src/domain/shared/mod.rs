//! Shared kernel - Common types used across the bridge

pub mod error;
pub mod value_objects;

pub use error::{DomainError, Result};
pub use value_objects::*;
