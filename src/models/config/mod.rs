//! Configuration loading and validation.

#![allow(clippy::result_large_err)]

mod error;
mod monitor_config;

pub use error::ConfigError;
pub use monitor_config::{MonitorConfig, ReconnectConfig};
