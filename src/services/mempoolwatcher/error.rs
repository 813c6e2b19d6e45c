//! Mempool watcher error types and handling.
//!
//! Only failures that stop the watcher are errors here. Per-transaction problems are
//! reported as [`TransactionOutcome`](super::TransactionOutcome)s instead.

use crate::utils::logging::error::{ErrorContext, TraceableError};
use std::collections::HashMap;
use thiserror::Error as ThisError;
use uuid::Uuid;

/// Represents errors that stop the mempool watcher
#[derive(ThisError, Debug)]
pub enum MempoolWatcherError {
	/// The first connection or subscription could not be established
	#[error("Initialization error: {0}")]
	InitializationError(ErrorContext),

	/// The subscription was lost and could not be re-established
	#[error("Subscription lost: {0}")]
	SubscriptionLost(ErrorContext),

	/// Other errors that don't fit into the categories above
	#[error(transparent)]
	Other(#[from] anyhow::Error),
}

impl MempoolWatcherError {
	// Initialization error
	pub fn initialization_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::InitializationError(ErrorContext::new_with_log(msg, source, metadata))
	}

	// Subscription lost
	pub fn subscription_lost(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::SubscriptionLost(ErrorContext::new_with_log(msg, source, metadata))
	}
}

impl TraceableError for MempoolWatcherError {
	fn trace_id(&self) -> String {
		match self {
			Self::InitializationError(ctx) => ctx.trace_id.clone(),
			Self::SubscriptionLost(ctx) => ctx.trace_id.clone(),
			Self::Other(_) => Uuid::new_v4().to_string(),
		}
	}
}
