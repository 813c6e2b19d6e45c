//! Core blockchain client interface.
//!
//! The watcher only needs two capabilities from a node: a stream of pending transaction
//! hashes and a point lookup of a transaction by hash.

use alloy::primitives::TxHash;
use async_trait::async_trait;

use crate::{
	models::EVMTransaction,
	services::blockchain::{error::BlockChainError, subscription::PendingTransactionSubscription},
};

/// Defines the interface to a node's pending transaction pool
///
/// Implementations are shared between the watcher loop and the lookup tasks.
#[async_trait]
pub trait PendingTransactionClient: Send + Sync + 'static {
	/// Subscribes to `newPendingTransactions`
	///
	/// # Returns
	/// * `Result<PendingTransactionSubscription, BlockChainError>` - The live subscription or
	///   the reason the node refused it
	async fn subscribe_pending_transactions(
		&self,
	) -> Result<PendingTransactionSubscription, BlockChainError>;

	/// Retrieves a transaction by hash
	///
	/// # Arguments
	/// * `hash` - Hash received from the subscription
	///
	/// # Returns
	/// * `Result<Option<EVMTransaction>, BlockChainError>` - `None` when the node no longer
	///   knows the transaction (dropped or replaced)
	async fn get_transaction_by_hash(
		&self,
		hash: TxHash,
	) -> Result<Option<EVMTransaction>, BlockChainError>;
}
