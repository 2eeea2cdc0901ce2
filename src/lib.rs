pub mod alert;
pub mod classify;
pub mod cli;
pub mod client;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod gate;
pub mod location;
pub mod logging;
pub mod registry;
pub mod services;
pub mod sink;
