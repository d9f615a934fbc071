//! Domain layer - call sessions and routing rules

pub mod call;
pub mod routing;
pub mod shared;
