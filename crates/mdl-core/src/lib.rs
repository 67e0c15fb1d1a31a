pub mod config;
pub mod logging;

pub mod backend;
pub mod classify;
pub mod error;
pub mod export;
pub mod gateway;
pub mod ids;
pub mod orchestrator;
pub mod queue;
pub mod resolver;
pub mod store;
