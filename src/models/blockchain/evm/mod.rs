//! Ethereum Virtual Machine (EVM) blockchain specific implementations.

mod transaction;

pub use transaction::{Recipient as EVMRecipient, Transaction as EVMTransaction};
