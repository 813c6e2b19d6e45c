//! Domain models and data structures for mempool monitoring.
//!
//! - `blockchain`: pending transaction records as returned by EVM nodes
//! - `config`: startup configuration and its validation

mod blockchain;
mod config;

pub use blockchain::evm::{EVMRecipient, EVMTransaction};

pub use config::{ConfigError, MonitorConfig, ReconnectConfig};
