#![forbid(unsafe_code)]

//! Chat command bot with a durable per-channel answer-generation queue.

pub mod chunker;
pub mod commands;
pub mod config;
pub mod config_watcher;
pub mod errors;
pub mod gateway;
pub mod models;
pub mod persistence;
pub mod queue;
pub mod services;
pub mod settings;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
