//! Shared test utilities.

pub mod description_server;
pub mod runtime;
