//! Infrastructure layer: document stores, services over them, configuration.

pub mod config;
pub mod numbering;
pub mod services;
pub mod store;
