//! Pending transaction subscription handle.
//!
//! A subscription is a pair of channels: transaction hashes pushed by the node and an
//! error signal. The client implementation owns the sending side (usually from a
//! forwarding task) and the watcher consumes events through [`next_event`].
//!
//! [`next_event`]: PendingTransactionSubscription::next_event

use alloy::primitives::TxHash;
use thiserror::Error;
use tokio::{sync::mpsc, task::AbortHandle};

/// Reason a subscription stopped delivering hashes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubscriptionError {
	/// The node or the transport closed the stream
	#[error("subscription closed")]
	Closed,

	/// The subscription reported an error
	#[error("subscription failed: {0}")]
	Failed(String),
}

/// Event read from a subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionEvent {
	Hash(TxHash),
	Error(SubscriptionError),
}

/// Sending side of a [`PendingTransactionSubscription`]
#[derive(Debug, Clone)]
pub struct SubscriptionSender {
	hashes: mpsc::Sender<TxHash>,
	errors: mpsc::Sender<SubscriptionError>,
}

impl SubscriptionSender {
	/// Delivers a hash. Returns `false` once the subscription has been dropped.
	pub async fn send_hash(&self, hash: TxHash) -> bool {
		self.hashes.send(hash).await.is_ok()
	}

	/// Signals an error. Returns `false` once the subscription has been dropped.
	pub async fn send_error(&self, error: SubscriptionError) -> bool {
		self.errors.send(error).await.is_ok()
	}

	/// Whether the receiving side is gone
	pub fn is_closed(&self) -> bool {
		self.hashes.is_closed()
	}
}

/// Stream of pending transaction hashes with a separate error signal
#[derive(Debug)]
pub struct PendingTransactionSubscription {
	hashes: mpsc::Receiver<TxHash>,
	errors: mpsc::Receiver<SubscriptionError>,
	forwarder: Option<AbortHandle>,
}

impl PendingTransactionSubscription {
	/// Creates a subscription and its sender. `capacity` bounds buffered hashes.
	pub fn channel(capacity: usize) -> (SubscriptionSender, Self) {
		let (hash_tx, hash_rx) = mpsc::channel(capacity.max(1));
		let (error_tx, error_rx) = mpsc::channel(1);
		(
			SubscriptionSender {
				hashes: hash_tx,
				errors: error_tx,
			},
			Self {
				hashes: hash_rx,
				errors: error_rx,
				forwarder: None,
			},
		)
	}

	/// Ties a forwarding task to the subscription; the task is aborted on drop.
	pub fn with_forwarder(mut self, forwarder: AbortHandle) -> Self {
		self.forwarder = Some(forwarder);
		self
	}

	/// Waits for the next event.
	///
	/// A pending error wins over buffered hashes. Once every sender is dropped the
	/// subscription reports [`SubscriptionError::Closed`].
	pub async fn next_event(&mut self) -> SubscriptionEvent {
		tokio::select! {
			biased;
			error = self.errors.recv() => {
				SubscriptionEvent::Error(error.unwrap_or(SubscriptionError::Closed))
			}
			hash = self.hashes.recv() => match hash {
				Some(hash) => SubscriptionEvent::Hash(hash),
				None => SubscriptionEvent::Error(SubscriptionError::Closed),
			}
		}
	}
}

impl Drop for PendingTransactionSubscription {
	fn drop(&mut self) {
		if let Some(forwarder) = self.forwarder.take() {
			forwarder.abort();
		}
	}
}
