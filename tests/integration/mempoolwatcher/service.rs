use std::{future::Future, sync::Arc, time::Duration};

use alloy::primitives::{TxHash, U256};
use futures::future::BoxFuture;
use tokio::{sync::watch, task::JoinHandle};

use crate::integration::mocks::{
	mock_connector, FakeClient, FakeNode, MockPendingTransactionClient, SharedBuffer,
};
use mempool_monitor::{
	models::ReconnectConfig,
	services::{
		blockchain::{BlockChainError, PendingTransactionSubscription, SubscriptionError},
		filter::ValueFilter,
		mempoolwatcher::{MempoolWatcherError, MempoolWatcherService, WatcherSettings, WatcherState},
		notification::ReportNotifier,
	},
	utils::tests::builders::evm::transaction::TransactionBuilder,
};
use rust_decimal::Decimal;

type FakeConnector = dyn Fn() -> BoxFuture<'static, Result<FakeClient, BlockChainError>> + Send + Sync;
type TestWatcher = MempoolWatcherService<FakeClient, ReportNotifier<SharedBuffer>, FakeConnector>;
type RunHandle = JoinHandle<Result<(), MempoolWatcherError>>;

fn settings() -> WatcherSettings {
	WatcherSettings {
		max_concurrent_lookups: 8,
		lookup_timeout: Duration::from_secs(5),
		reconnect: ReconnectConfig {
			max_attempts: 0,
			initial_backoff: Duration::from_millis(10),
			max_backoff: Duration::from_millis(50),
		},
		shutdown_grace_period: Duration::from_secs(5),
	}
}

fn with_reconnect(attempts: u32) -> WatcherSettings {
	let mut settings = settings();
	settings.reconnect.max_attempts = attempts;
	settings
}

fn one_ether() -> U256 {
	U256::from(1_000_000_000_000_000_000u64)
}

/// Makes the node know a transaction sending one ether
fn insert_value_transfer(node: &FakeNode, byte: u8) -> TxHash {
	let hash = TxHash::repeat_byte(byte);
	node.insert_transaction(
		hash,
		TransactionBuilder::new().hash(hash).value(one_ether()).build(),
	);
	hash
}

fn start(
	node: &FakeNode,
	settings: WatcherSettings,
) -> (Arc<TestWatcher>, SharedBuffer, watch::Sender<bool>, RunHandle) {
	let output = SharedBuffer::new();
	let notifier = ReportNotifier::new(
		output.clone(),
		ValueFilter::new(Decimal::from(5), false).unwrap(),
	);
	let watcher = Arc::new(MempoolWatcherService::new(
		node.connector(),
		Arc::new(notifier),
		settings,
	));

	let (shutdown_tx, shutdown_rx) = watch::channel(false);
	let handle = {
		let watcher = watcher.clone();
		tokio::spawn(async move { watcher.run(shutdown_rx).await })
	};

	(watcher, output, shutdown_tx, handle)
}

/// Polls `condition` until it holds, failing the test after a few seconds
async fn wait_until(condition: impl Fn() -> bool) {
	tokio::time::timeout(Duration::from_secs(5), async {
		while !condition() {
			tokio::time::sleep(Duration::from_millis(5)).await;
		}
	})
	.await
	.expect("condition not reached in time");
}

async fn join<F: Future>(future: F) -> F::Output {
	tokio::time::timeout(Duration::from_secs(5), future)
		.await
		.expect("watcher did not stop in time")
}

#[tokio::test]
async fn test_reports_only_value_transfers() {
	let node = FakeNode::new();
	let transfer = insert_value_transfer(&node, 1);
	let zero_value = TxHash::repeat_byte(2);
	node.insert_transaction(zero_value, TransactionBuilder::new().hash(zero_value).build());

	let (watcher, output, shutdown_tx, handle) = start(&node, settings());
	wait_until(|| node.subscriptions() == 1).await;
	assert_eq!(*watcher.state().borrow(), WatcherState::Subscribed);

	assert!(node.push_hash(transfer).await);
	assert!(node.push_hash(zero_value).await);
	wait_until(|| watcher.stats().snapshot().completed() == 2).await;

	shutdown_tx.send(true).unwrap();
	join(handle).await.unwrap().unwrap();

	let snapshot = watcher.stats().snapshot();
	assert_eq!(snapshot.received, 2);
	assert_eq!(snapshot.reported, 1);
	assert_eq!(snapshot.filtered, 1);
	assert_eq!(output.report_count(), 1);
	assert!(output.contents().contains(&format!("TX HASH: {}", transfer)));
	assert_eq!(*watcher.state().borrow(), WatcherState::Terminated);
}

#[tokio::test]
async fn test_unknown_and_failing_lookups_do_not_stop_the_watcher() {
	let node = FakeNode::new();
	let unknown = TxHash::repeat_byte(1);
	let failing = insert_value_transfer(&node, 2);
	node.fail_lookup(failing);
	let transfer = insert_value_transfer(&node, 3);

	let (watcher, output, shutdown_tx, handle) = start(&node, settings());
	wait_until(|| node.subscriptions() == 1).await;

	node.push_hash(unknown).await;
	node.push_hash(failing).await;
	node.push_hash(transfer).await;
	wait_until(|| watcher.stats().snapshot().completed() == 3).await;

	let snapshot = watcher.stats().snapshot();
	assert_eq!(snapshot.not_found, 1);
	assert_eq!(snapshot.failed, 1);
	assert_eq!(snapshot.reported, 1);
	assert_eq!(output.report_count(), 1);

	shutdown_tx.send(true).unwrap();
	join(handle).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_subscription_error_without_reconnect_stops_processing() {
	let node = FakeNode::new();
	let slow = insert_value_transfer(&node, 1);
	node.delay_lookup(slow, Duration::from_millis(300));
	let queued = insert_value_transfer(&node, 2);
	let late = insert_value_transfer(&node, 3);

	let mut settings = settings();
	settings.max_concurrent_lookups = 1;
	let (watcher, _output, _shutdown_tx, handle) = start(&node, settings);
	wait_until(|| node.subscriptions() == 1).await;

	node.push_hash(slow).await;
	wait_until(|| node.lookups().contains(&slow)).await;
	// The loop holds `queued` while it waits for the only permit
	node.push_hash(queued).await;
	wait_until(|| watcher.stats().snapshot().received == 2).await;

	node.push_hash(late).await;
	node
		.fail_subscription(SubscriptionError::Failed("node went away".to_string()))
		.await;

	let result = join(handle).await.unwrap();
	assert!(matches!(result, Err(MempoolWatcherError::SubscriptionLost(_))));

	assert!(!node.lookups().contains(&late));
	assert!(!node.push_hash(TxHash::repeat_byte(4)).await);
	assert_eq!(node.connects(), 1);
	assert_eq!(*watcher.state().borrow(), WatcherState::Terminated);
}

#[tokio::test]
async fn test_closed_subscription_is_reestablished() {
	let node = FakeNode::new();
	let before = insert_value_transfer(&node, 1);
	let after = insert_value_transfer(&node, 2);

	let (watcher, output, shutdown_tx, handle) = start(&node, with_reconnect(3));
	wait_until(|| node.subscriptions() == 1).await;

	node.push_hash(before).await;
	wait_until(|| watcher.stats().snapshot().completed() == 1).await;

	node.close_subscriptions();
	wait_until(|| node.subscriptions() == 2).await;

	assert!(node.push_hash(after).await);
	wait_until(|| watcher.stats().snapshot().completed() == 2).await;

	shutdown_tx.send(true).unwrap();
	join(handle).await.unwrap().unwrap();

	let snapshot = watcher.stats().snapshot();
	assert_eq!(snapshot.reconnects, 1);
	assert_eq!(snapshot.reported, 2);
	assert_eq!(output.report_count(), 2);
}

#[tokio::test]
async fn test_reconnect_retries_failed_connects() {
	let node = FakeNode::new();
	let after = insert_value_transfer(&node, 1);

	let (watcher, _output, shutdown_tx, handle) = start(&node, with_reconnect(5));
	wait_until(|| node.subscriptions() == 1).await;

	node.fail_connects(2);
	node
		.fail_subscription(SubscriptionError::Failed("reset".to_string()))
		.await;
	wait_until(|| node.subscriptions() == 2).await;
	assert_eq!(node.connects(), 4);

	node.push_hash(after).await;
	wait_until(|| watcher.stats().snapshot().reported == 1).await;

	shutdown_tx.send(true).unwrap();
	join(handle).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_reconnect_budget_exhausted() {
	let node = FakeNode::new();

	let (_watcher, _output, _shutdown_tx, handle) = start(&node, with_reconnect(3));
	wait_until(|| node.subscriptions() == 1).await;

	node.fail_connects(usize::MAX);
	node.close_subscriptions();

	let result = join(handle).await.unwrap();
	match result {
		Err(MempoolWatcherError::SubscriptionLost(ctx)) => {
			assert_eq!(
				ctx.metadata.as_ref().and_then(|m| m.get("attempts")),
				Some(&"3".to_string())
			);
		}
		other => panic!("expected SubscriptionLost, got {:?}", other),
	}
	// The initial connect plus three attempts
	assert_eq!(node.connects(), 4);
	assert_eq!(node.subscriptions(), 1);
}

#[tokio::test]
async fn test_initial_connect_failure_is_fatal() {
	let node = FakeNode::new();
	node.fail_connects(1);

	let (watcher, _output, _shutdown_tx, handle) = start(&node, with_reconnect(5));

	let result = join(handle).await.unwrap();
	assert!(matches!(
		result,
		Err(MempoolWatcherError::InitializationError(_))
	));
	assert_eq!(node.connects(), 1);
	assert_eq!(*watcher.state().borrow(), WatcherState::Terminated);
}

#[tokio::test]
async fn test_initial_subscribe_failure_is_fatal() {
	let mut client = MockPendingTransactionClient::new();
	client
		.expect_subscribe_pending_transactions()
		.times(1)
		.returning(|| {
			Err(BlockChainError::subscription_error(
				"method not supported",
				None,
				None,
			))
		});
	client.expect_get_transaction_by_hash().times(0);

	let notifier = ReportNotifier::new(
		SharedBuffer::new(),
		ValueFilter::new(Decimal::from(5), false).unwrap(),
	);
	let watcher = MempoolWatcherService::new(
		Arc::new(mock_connector(vec![Ok(client)])),
		Arc::new(notifier),
		with_reconnect(5),
	);

	let (_shutdown_tx, shutdown_rx) = watch::channel(false);
	let result = join(watcher.run(shutdown_rx)).await;

	assert!(matches!(
		result,
		Err(MempoolWatcherError::InitializationError(_))
	));
}

#[tokio::test]
async fn test_subscription_from_mock_client_is_processed() {
	let (sender, subscription) = PendingTransactionSubscription::channel(8);
	let hash = TxHash::repeat_byte(9);
	let transaction = TransactionBuilder::new().hash(hash).value(one_ether()).build();

	let mut client = MockPendingTransactionClient::new();
	client
		.expect_subscribe_pending_transactions()
		.times(1)
		.return_once(move || Ok(subscription));
	client
		.expect_get_transaction_by_hash()
		.times(1)
		.returning(move |_| Ok(Some(transaction.clone())));

	let output = SharedBuffer::new();
	let notifier = ReportNotifier::new(
		output.clone(),
		ValueFilter::new(Decimal::from(5), false).unwrap(),
	);
	let watcher = Arc::new(MempoolWatcherService::new(
		Arc::new(mock_connector(vec![Ok(client)])),
		Arc::new(notifier),
		settings(),
	));

	let (shutdown_tx, shutdown_rx) = watch::channel(false);
	let handle = {
		let watcher = watcher.clone();
		tokio::spawn(async move { watcher.run(shutdown_rx).await })
	};

	assert!(sender.send_hash(hash).await);
	wait_until(|| watcher.stats().snapshot().reported == 1).await;

	shutdown_tx.send(true).unwrap();
	join(handle).await.unwrap().unwrap();
	assert_eq!(output.report_count(), 1);
}

#[tokio::test]
async fn test_lookup_timeout_only_fails_its_own_task() {
	let node = FakeNode::new();
	let stuck = insert_value_transfer(&node, 1);
	node.delay_lookup(stuck, Duration::from_secs(30));
	let transfer = insert_value_transfer(&node, 2);

	let mut settings = settings();
	settings.lookup_timeout = Duration::from_millis(100);
	let (watcher, output, shutdown_tx, handle) = start(&node, settings);
	wait_until(|| node.subscriptions() == 1).await;

	node.push_hash(stuck).await;
	node.push_hash(transfer).await;
	wait_until(|| watcher.stats().snapshot().completed() == 2).await;

	let snapshot = watcher.stats().snapshot();
	assert_eq!(snapshot.timed_out, 1);
	assert_eq!(snapshot.reported, 1);
	assert!(output.contents().contains(&format!("TX HASH: {}", transfer)));
	assert!(!output.contents().contains(&format!("TX HASH: {}", stuck)));

	shutdown_tx.send(true).unwrap();
	join(handle).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_in_flight_lookups_are_bounded() {
	let node = FakeNode::new();
	let hashes: Vec<TxHash> = (1..=6u8)
		.map(|byte| {
			let hash = insert_value_transfer(&node, byte);
			node.delay_lookup(hash, Duration::from_millis(50));
			hash
		})
		.collect();

	let mut settings = settings();
	settings.max_concurrent_lookups = 2;
	let (watcher, output, shutdown_tx, handle) = start(&node, settings);
	wait_until(|| node.subscriptions() == 1).await;

	for hash in &hashes {
		node.push_hash(*hash).await;
	}
	wait_until(|| watcher.stats().snapshot().completed() == 6).await;

	let snapshot = watcher.stats().snapshot();
	assert!(snapshot.max_in_flight <= 2);
	assert_eq!(snapshot.reported, 6);
	assert_eq!(output.report_count(), 6);

	shutdown_tx.send(true).unwrap();
	join(handle).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_shutdown_drains_in_flight_lookups() {
	let node = FakeNode::new();
	let slow = insert_value_transfer(&node, 1);
	node.delay_lookup(slow, Duration::from_millis(200));

	let (watcher, output, shutdown_tx, handle) = start(&node, settings());
	wait_until(|| node.subscriptions() == 1).await;

	node.push_hash(slow).await;
	wait_until(|| node.lookups().contains(&slow)).await;

	shutdown_tx.send(true).unwrap();
	join(handle).await.unwrap().unwrap();

	let snapshot = watcher.stats().snapshot();
	assert_eq!(snapshot.reported, 1);
	assert_eq!(snapshot.in_flight, 0);
	assert_eq!(output.report_count(), 1);
}

#[tokio::test]
async fn test_shutdown_aborts_lookups_after_grace_period() {
	let node = FakeNode::new();
	let stuck = insert_value_transfer(&node, 1);
	node.delay_lookup(stuck, Duration::from_secs(30));

	let mut settings = settings();
	settings.lookup_timeout = Duration::from_secs(60);
	settings.shutdown_grace_period = Duration::from_millis(50);
	let (watcher, output, shutdown_tx, handle) = start(&node, settings);
	wait_until(|| node.subscriptions() == 1).await;

	node.push_hash(stuck).await;
	wait_until(|| node.lookups().contains(&stuck)).await;

	shutdown_tx.send(true).unwrap();
	join(handle).await.unwrap().unwrap();

	let snapshot = watcher.stats().snapshot();
	assert_eq!(snapshot.reported, 0);
	assert_eq!(snapshot.in_flight, 0);
	assert_eq!(output.report_count(), 0);
}

#[tokio::test]
async fn test_shutdown_before_connect_returns_cleanly() {
	let node = FakeNode::new();
	let notifier = ReportNotifier::new(
		SharedBuffer::new(),
		ValueFilter::new(Decimal::from(5), false).unwrap(),
	);
	let watcher: TestWatcher =
		MempoolWatcherService::new(node.connector(), Arc::new(notifier), settings());

	let (shutdown_tx, shutdown_rx) = watch::channel(false);
	shutdown_tx.send(true).unwrap();

	join(watcher.run(shutdown_rx)).await.unwrap();
	assert_eq!(node.connects(), 0);
}
