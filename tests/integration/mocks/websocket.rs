//! WebSocket JSON-RPC node speaking just enough of the Ethereum API for the EVM client.
//!
//! Answers `eth_subscribe("newPendingTransactions")` and `eth_getTransactionByHash`.
//! Subscription notifications are only sent on request so tests control their timing.

use std::{
	collections::HashMap,
	sync::{Arc, Mutex},
};

use alloy::primitives::TxHash;
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::mpsc, task::JoinHandle};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use url::Url;

use mempool_monitor::models::EVMTransaction;

const SUBSCRIPTION_ID: &str = "0x9cef478923ff08bf67fde6c64013158d";

/// Running fake node; the server stops when this is dropped
pub struct WsNode {
	url: Url,
	transactions: Arc<Mutex<HashMap<TxHash, EVMTransaction>>>,
	failing_lookups: Arc<Mutex<Vec<TxHash>>>,
	notifications: mpsc::UnboundedSender<TxHash>,
	server: JoinHandle<()>,
}

impl WsNode {
	/// Binds a local port and serves a single connection
	pub async fn start() -> Self {
		let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
		let address = listener.local_addr().unwrap();
		let transactions = Arc::new(Mutex::new(HashMap::new()));
		let failing_lookups = Arc::new(Mutex::new(Vec::new()));
		let (notifications, notification_rx) = mpsc::unbounded_channel();

		let server = tokio::spawn(serve(
			listener,
			transactions.clone(),
			failing_lookups.clone(),
			notification_rx,
		));

		Self {
			url: Url::parse(&format!("ws://{}", address)).unwrap(),
			transactions,
			failing_lookups,
			notifications,
			server,
		}
	}

	pub fn url(&self) -> &Url {
		&self.url
	}

	pub fn insert_transaction(&self, hash: TxHash, transaction: EVMTransaction) {
		self.transactions.lock().unwrap().insert(hash, transaction);
	}

	/// Answers lookups of `hash` with a JSON-RPC error
	pub fn fail_lookup(&self, hash: TxHash) {
		self.failing_lookups.lock().unwrap().push(hash);
	}

	/// Sends a `newPendingTransactions` notification
	pub fn announce(&self, hash: TxHash) {
		self.notifications.send(hash).unwrap();
	}
}

impl Drop for WsNode {
	fn drop(&mut self) {
		self.server.abort();
	}
}

async fn serve(
	listener: TcpListener,
	transactions: Arc<Mutex<HashMap<TxHash, EVMTransaction>>>,
	failing_lookups: Arc<Mutex<Vec<TxHash>>>,
	mut notifications: mpsc::UnboundedReceiver<TxHash>,
) {
	let Ok((stream, _)) = listener.accept().await else {
		return;
	};
	let Ok(socket) = accept_async(stream).await else {
		return;
	};
	let (mut write, mut read) = socket.split();
	let mut subscribed = false;

	loop {
		tokio::select! {
			message = read.next() => {
				let text = match message {
					Some(Ok(Message::Text(text))) => text,
					Some(Ok(_)) => continue,
					_ => return,
				};
				let Ok(request) = serde_json::from_str::<Value>(&text) else {
					continue;
				};
				let id = request["id"].clone();
				let response = match request["method"].as_str() {
					Some("eth_subscribe") => {
						subscribed = true;
						json!({ "jsonrpc": "2.0", "id": id, "result": SUBSCRIPTION_ID })
					}
					Some("eth_unsubscribe") => json!({ "jsonrpc": "2.0", "id": id, "result": true }),
					Some("eth_getTransactionByHash") => {
						let hash = request["params"][0]
							.as_str()
							.and_then(|hash| hash.parse::<TxHash>().ok());
						match hash {
							Some(hash) if failing_lookups.lock().unwrap().contains(&hash) => json!({
								"jsonrpc": "2.0",
								"id": id,
								"error": { "code": -32000, "message": "internal error" }
							}),
							Some(hash) => {
								let transaction = transactions.lock().unwrap().get(&hash).cloned();
								json!({ "jsonrpc": "2.0", "id": id, "result": transaction })
							}
							None => json!({
								"jsonrpc": "2.0",
								"id": id,
								"error": { "code": -32602, "message": "invalid params" }
							}),
						}
					}
					_ => json!({
						"jsonrpc": "2.0",
						"id": id,
						"error": { "code": -32601, "message": "method not found" }
					}),
				};
				if write.send(Message::Text(response.to_string())).await.is_err() {
					return;
				}
			}
			Some(hash) = notifications.recv(), if subscribed => {
				let notification = json!({
					"jsonrpc": "2.0",
					"method": "eth_subscription",
					"params": { "subscription": SUBSCRIPTION_ID, "result": hash }
				});
				if write.send(Message::Text(notification.to_string())).await.is_err() {
					return;
				}
			}
		}
	}
}
