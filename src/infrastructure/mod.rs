//! Infrastructure layer - runtime protocol and metrics

pub mod jambonz;
pub mod metrics;
