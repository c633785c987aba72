//! Core evento library (API client, session, forms, config).

pub mod client;
pub mod config;
pub mod forms;
pub mod logging;
pub mod search;
pub mod session;

pub use evento_types as types;
