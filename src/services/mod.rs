//! Core services implementing the business logic.
//!
//! - `blockchain`: Node client interface and the alloy-backed EVM client
//! - `filter`: Value filter deciding which transactions are reported
//! - `mempoolwatcher`: Subscription loop and per-transaction processing
//! - `notification`: Transaction reports

pub mod blockchain;
pub mod filter;
pub mod mempoolwatcher;
pub mod notification;
