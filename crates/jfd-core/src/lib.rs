pub mod config;
pub mod logging;

pub mod catalog;
pub mod control;
pub mod error;
pub mod orchestrator;
pub mod schedule;
pub mod session;
pub mod transfer;
pub mod url_model;
