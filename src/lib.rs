//! Mempool Monitor Library
//!
//! This library watches the pending transactions of an EVM node and reports the ones
//! transferring value.
//!
//! # Module Structure
//!
//! - `bootstrap`: Service initialization and wiring
//! - `models`: Configuration and transaction data structures
//! - `services`: Node client, value filter, reports and the mempool watcher
//! - `utils`: Units, parsing, logging and metrics helpers

pub mod bootstrap;
pub mod models;
pub mod services;
pub mod utils;
