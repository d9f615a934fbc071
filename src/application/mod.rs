//! Application layer - the services exposed to the call-control runtime

pub mod retell_service;

pub use retell_service::RetellService;
