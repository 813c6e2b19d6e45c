//! Mempool watcher service implementation.
//!
//! Drives the pending transaction subscription through the `Connecting`, `Subscribed` and
//! `Terminated` states. Every received hash is resolved by its own task; tasks are bounded
//! by a semaphore, tracked in a [`JoinSet`] and drained when the watcher stops.

use std::{collections::HashMap, sync::Arc, time::Duration};

use backon::{ExponentialBuilder, Retryable};
use futures::future::BoxFuture;
use tokio::{
	sync::{watch, Semaphore},
	task::{JoinError, JoinSet},
};
use tracing::{debug, error, info, instrument, warn};

use crate::{
	models::{MonitorConfig, ReconnectConfig},
	services::{
		blockchain::{
			BlockChainError, PendingTransactionClient, PendingTransactionSubscription,
			SubscriptionEvent,
		},
		mempoolwatcher::{
			error::MempoolWatcherError,
			handler::{process_transaction, TransactionOutcome, WatcherStats},
		},
		notification::Notifier,
	},
};

/// Lifecycle state of the watcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherState {
	Connecting,
	Subscribed,
	/// Absorbing; the watcher never leaves it
	Terminated,
}

/// Runtime settings of the watcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatcherSettings {
	pub max_concurrent_lookups: usize,
	pub lookup_timeout: Duration,
	pub reconnect: ReconnectConfig,
	pub shutdown_grace_period: Duration,
}

impl From<&MonitorConfig> for WatcherSettings {
	fn from(config: &MonitorConfig) -> Self {
		Self {
			max_concurrent_lookups: config.max_concurrent_lookups,
			lookup_timeout: config.lookup_timeout,
			reconnect: config.reconnect.clone(),
			shutdown_grace_period: config.shutdown_grace_period,
		}
	}
}

/// Watches a node's pending transactions and presents them through a notifier
///
/// # Type Parameters
/// * `C` - Client produced by the connector
/// * `N` - Notifier presenting resolved transactions
/// * `F` - Connector dialing the node; called once at start and on every reconnect attempt
pub struct MempoolWatcherService<C, N, F: ?Sized> {
	connector: Arc<F>,
	notifier: Arc<N>,
	settings: WatcherSettings,
	stats: Arc<WatcherStats>,
	state: watch::Sender<WatcherState>,
	_client: std::marker::PhantomData<fn() -> C>,
}

impl<C, N, F> MempoolWatcherService<C, N, F>
where
	C: PendingTransactionClient,
	N: Notifier,
	F: Fn() -> BoxFuture<'static, Result<C, BlockChainError>> + Send + Sync + ?Sized + 'static,
{
	/// Creates a new watcher
	///
	/// # Arguments
	/// * `connector` - Dials the node and returns a connected client
	/// * `notifier` - Presents resolved transactions
	/// * `settings` - Concurrency, timeout, reconnect and shutdown settings
	pub fn new(connector: Arc<F>, notifier: Arc<N>, settings: WatcherSettings) -> Self {
		let (state, _) = watch::channel(WatcherState::Connecting);
		Self {
			connector,
			notifier,
			settings,
			stats: Arc::new(WatcherStats::new()),
			state,
			_client: std::marker::PhantomData,
		}
	}

	pub fn stats(&self) -> Arc<WatcherStats> {
		self.stats.clone()
	}

	/// Receiver following the watcher's state transitions
	pub fn state(&self) -> watch::Receiver<WatcherState> {
		self.state.subscribe()
	}

	/// Runs the watcher until shutdown is requested or the subscription is lost for good
	///
	/// Shutdown is requested by sending `true` on the channel behind `shutdown`.
	///
	/// # Returns
	/// * `Ok(())` - After a requested shutdown
	/// * `Err(MempoolWatcherError::InitializationError)` - The first connect or subscribe failed
	/// * `Err(MempoolWatcherError::SubscriptionLost)` - The subscription failed and could not be
	///   re-established
	#[instrument(skip_all)]
	pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), MempoolWatcherError> {
		self.set_state(WatcherState::Connecting);

		let established = tokio::select! {
			biased;
			_ = wait_for_shutdown(&mut shutdown) => None,
			result = establish(self.connector.as_ref()) => Some(result),
		};
		let (mut client, mut subscription) = match established {
			None => {
				self.set_state(WatcherState::Terminated);
				return Ok(());
			}
			Some(Ok(established)) => established,
			Some(Err(e)) => {
				self.set_state(WatcherState::Terminated);
				return Err(MempoolWatcherError::initialization_error(
					"Failed to subscribe to pending transactions",
					Some(Box::new(e)),
					None,
				));
			}
		};

		self.set_state(WatcherState::Subscribed);
		info!("Subscribed to pending transactions");

		let semaphore = Arc::new(Semaphore::new(self.settings.max_concurrent_lookups));
		let mut tasks: JoinSet<TransactionOutcome> = JoinSet::new();

		let result = loop {
			while let Some(joined) = tasks.try_join_next() {
				log_join_error(joined);
			}

			let event = tokio::select! {
				biased;
				_ = wait_for_shutdown(&mut shutdown) => break Ok(()),
				event = subscription.next_event() => event,
			};

			match event {
				SubscriptionEvent::Hash(hash) => {
					self.stats.record_received();

					let permit = tokio::select! {
						biased;
						_ = wait_for_shutdown(&mut shutdown) => break Ok(()),
						permit = semaphore.clone().acquire_owned() => permit,
					};
					// The semaphore is never closed
					let Ok(permit) = permit else {
						break Ok(());
					};

					let client = client.clone();
					let notifier = self.notifier.clone();
					let stats = self.stats.clone();
					let lookup_timeout = self.settings.lookup_timeout;
					let in_flight = stats.track_in_flight();
					tasks.spawn(async move {
						let _permit = permit;
						let _in_flight = in_flight;
						let outcome = process_transaction(client, notifier, hash, lookup_timeout).await;
						stats.record_outcome(&outcome);
						outcome
					});
				}
				SubscriptionEvent::Error(reason) => {
					warn!(%reason, "Pending transaction subscription lost");
					drop(subscription);
					self.set_state(WatcherState::Connecting);

					match self.reconnect(&mut shutdown).await {
						Ok(Some((new_client, new_subscription))) => {
							client = new_client;
							subscription = new_subscription;
							self.stats.record_reconnect();
							self.set_state(WatcherState::Subscribed);
							info!("Re-subscribed to pending transactions");
						}
						Ok(None) => break Ok(()),
						Err(e) => break Err(e),
					}
				}
			}
		};

		self.set_state(WatcherState::Terminated);
		self.drain(tasks).await;
		result
	}

	/// Re-establishes the subscription with exponential backoff.
	///
	/// Returns `Ok(None)` when shutdown is requested while reconnecting.
	async fn reconnect(
		&self,
		shutdown: &mut watch::Receiver<bool>,
	) -> Result<Option<(Arc<C>, PendingTransactionSubscription)>, MempoolWatcherError> {
		let policy = &self.settings.reconnect;
		if !policy.is_enabled() {
			return Err(MempoolWatcherError::subscription_lost(
				"Pending transaction subscription lost and reconnecting is disabled",
				None,
				None,
			));
		}

		let backoff = ExponentialBuilder::default()
			.with_min_delay(policy.initial_backoff)
			.with_max_delay(policy.max_backoff)
			.with_max_times(policy.max_attempts.saturating_sub(1) as usize)
			.with_jitter();

		let attempt = (|| establish(self.connector.as_ref()))
			.retry(backoff)
			.notify(|e: &BlockChainError, delay: Duration| {
				warn!(
					error = %e,
					retry_in_ms = delay.as_millis() as u64,
					"Reconnect attempt failed"
				);
			});

		let result = tokio::select! {
			biased;
			_ = wait_for_shutdown(shutdown) => return Ok(None),
			result = attempt => result,
		};

		result.map(Some).map_err(|e| {
			MempoolWatcherError::subscription_lost(
				"Failed to re-establish the pending transaction subscription",
				Some(Box::new(e)),
				Some(HashMap::from([(
					"attempts".to_string(),
					policy.max_attempts.to_string(),
				)])),
			)
		})
	}

	/// Waits for in-flight lookups up to the grace period, then aborts the rest
	async fn drain(&self, mut tasks: JoinSet<TransactionOutcome>) {
		if tasks.is_empty() {
			return;
		}

		info!(in_flight = tasks.len(), "Waiting for in-flight lookups");
		let drained = tokio::time::timeout(self.settings.shutdown_grace_period, async {
			while let Some(joined) = tasks.join_next().await {
				log_join_error(joined);
			}
		})
		.await;

		if drained.is_err() {
			warn!(
				remaining = tasks.len(),
				"Shutdown grace period elapsed, aborting remaining lookups"
			);
			tasks.shutdown().await;
		}
	}

	fn set_state(&self, state: WatcherState) {
		let previous = self.state.send_replace(state);
		if previous != state {
			debug!(?previous, current = ?state, "watcher state changed");
		}
	}
}

/// Connects and subscribes once
async fn establish<C, F>(
	connector: &F,
) -> Result<(Arc<C>, PendingTransactionSubscription), BlockChainError>
where
	C: PendingTransactionClient,
	F: Fn() -> BoxFuture<'static, Result<C, BlockChainError>> + ?Sized,
{
	let client = Arc::new(connector().await?);
	let subscription = client.subscribe_pending_transactions().await?;
	Ok((client, subscription))
}

/// Resolves once `true` is observed on the channel. A dropped sender never resolves.
async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
	loop {
		if *shutdown.borrow_and_update() {
			return;
		}
		if shutdown.changed().await.is_err() {
			std::future::pending::<()>().await;
		}
	}
}

fn log_join_error(joined: Result<TransactionOutcome, JoinError>) {
	if let Err(e) = joined {
		if e.is_panic() {
			error!(error = %e, "Transaction task panicked");
		}
	}
}
