//! Blockchain client interfaces and implementations.
//!
//! - Pending transaction client trait
//! - Subscription handle shared by all clients
//! - EVM client backed by an alloy WebSocket provider
//! - Error handling for blockchain operations

mod client;
mod clients;
mod error;
mod subscription;

pub use client::PendingTransactionClient;
pub use clients::EvmClient;
pub use error::BlockChainError;
pub use subscription::{
	PendingTransactionSubscription, SubscriptionError, SubscriptionEvent, SubscriptionSender,
};
