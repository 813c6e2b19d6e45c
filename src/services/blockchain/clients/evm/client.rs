//! EVM-compatible blockchain client implementation.
//!
//! Talks to the node over a WebSocket connection managed by alloy's pub/sub provider.
//! The subscription is bridged onto a [`PendingTransactionSubscription`] by a forwarding
//! task owned by the subscription handle.

use std::collections::HashMap;

use alloy::{
	primitives::TxHash,
	providers::{DynProvider, Provider, ProviderBuilder, WsConnect},
};
use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::{
	models::EVMTransaction,
	services::blockchain::{
		client::PendingTransactionClient,
		error::BlockChainError,
		subscription::{PendingTransactionSubscription, SubscriptionError},
	},
	utils::constants::SUBSCRIPTION_CHANNEL_CAPACITY,
};

/// Client implementation for Ethereum Virtual Machine (EVM) compatible blockchains
#[derive(Clone)]
pub struct EvmClient {
	provider: DynProvider,
	channel_capacity: usize,
}

impl EvmClient {
	/// Creates a new EVM client on top of an existing provider
	pub fn new_with_provider(provider: DynProvider) -> Self {
		Self {
			provider,
			channel_capacity: SUBSCRIPTION_CHANNEL_CAPACITY,
		}
	}

	/// Dials the node's WebSocket endpoint
	///
	/// # Arguments
	/// * `url` - `ws://` or `wss://` endpoint of the node
	///
	/// # Returns
	/// * `Result<Self, BlockChainError>` - Connected client or connection error
	#[instrument(skip_all, fields(url = %url))]
	pub async fn connect(url: &Url) -> Result<Self, BlockChainError> {
		let provider = ProviderBuilder::new()
			.connect_ws(WsConnect::new(url.as_str()))
			.await
			.map_err(|e| {
				BlockChainError::connection_error(
					"Failed to connect to node",
					Some(Box::new(e)),
					Some(HashMap::from([("url".to_string(), url.to_string())])),
				)
			})?;

		debug!("connected to node");
		Ok(Self::new_with_provider(provider.erased()))
	}
}

#[async_trait]
impl PendingTransactionClient for EvmClient {
	#[instrument(skip(self))]
	async fn subscribe_pending_transactions(
		&self,
	) -> Result<PendingTransactionSubscription, BlockChainError> {
		let mut subscription = self
			.provider
			.subscribe_pending_transactions()
			.await
			.map_err(|e| {
				BlockChainError::subscription_error(
					"Failed to subscribe to pending transactions",
					Some(Box::new(e)),
					None,
				)
			})?;

		let (sender, pending) = PendingTransactionSubscription::channel(self.channel_capacity);
		let forwarder = tokio::spawn(async move {
			loop {
				match subscription.recv().await {
					Ok(hash) => {
						if !sender.send_hash(hash).await {
							break;
						}
					}
					Err(RecvError::Lagged(skipped)) => {
						warn!(skipped, "Pending transaction subscription lagged, hashes were dropped");
					}
					Err(RecvError::Closed) => {
						sender.send_error(SubscriptionError::Closed).await;
						break;
					}
				}
			}
		});

		Ok(pending.with_forwarder(forwarder.abort_handle()))
	}

	#[instrument(skip(self), fields(tx_hash = %hash))]
	async fn get_transaction_by_hash(
		&self,
		hash: TxHash,
	) -> Result<Option<EVMTransaction>, BlockChainError> {
		let transaction = self
			.provider
			.raw_request::<_, Option<Map<String, Value>>>(
				"eth_getTransactionByHash".into(),
				(hash,),
			)
			.await
			.map_err(|e| {
				BlockChainError::request_error(
					"Failed to get transaction by hash",
					Some(Box::new(e)),
					Some(HashMap::from([("tx_hash".to_string(), hash.to_string())])),
				)
			})?;

		Ok(transaction.map(EVMTransaction::from))
	}
}
