//! Notification error types and handling.
//!
//! Provides error types for presenting transactions, covering records that cannot be
//! decoded and failures of the output sink.

use crate::utils::logging::error::{ErrorContext, TraceableError};
use std::collections::HashMap;
use thiserror::Error as ThisError;

/// Represents errors that can occur during notification operations
#[derive(ThisError, Debug)]
pub enum NotificationError {
	/// The transaction record cannot be presented (undecodable value)
	#[error("Invalid transaction: {0}")]
	InvalidTransaction(Box<ErrorContext>),

	/// Writing the report to the output failed
	#[error("Write error: {0}")]
	WriteError(Box<ErrorContext>),

	/// Errors related to internal processing errors
	#[error("Internal error: {0}")]
	InternalError(Box<ErrorContext>),
}

impl NotificationError {
	// Invalid transaction. The underlying filter error has already been logged.
	pub fn invalid_transaction(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::InvalidTransaction(Box::new(ErrorContext::new(msg, source, metadata)))
	}

	// Write error
	pub fn write_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::WriteError(Box::new(ErrorContext::new_with_log(msg, source, metadata)))
	}

	// Internal error
	pub fn internal_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::InternalError(Box::new(ErrorContext::new_with_log(msg, source, metadata)))
	}
}

impl TraceableError for NotificationError {
	fn trace_id(&self) -> String {
		match self {
			Self::InvalidTransaction(ctx) => ctx.trace_id.clone(),
			Self::WriteError(ctx) => ctx.trace_id.clone(),
			Self::InternalError(ctx) => ctx.trace_id.clone(),
		}
	}
}
