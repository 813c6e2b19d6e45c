//! Mempool monitoring service entry point.
//!
//! This binary subscribes to the pending transactions of an EVM node over WebSocket,
//! resolves every announced transaction and prints a report for those transferring value.
//!
//! # Flow
//! 1. Loads `.env` and applies CLI options onto the environment
//! 2. Sets up logging (stderr by default, standard output only carries reports)
//! 3. Builds and validates the configuration
//! 4. Starts the optional metrics server
//! 5. Runs the mempool watcher until Ctrl+C or until the subscription is lost for good

use mempool_monitor::{
	bootstrap::{initialize_services, load_env_file, Result},
	models::MonitorConfig,
	utils::{
		logging::setup_logging,
		metrics::server::{create_metrics_server, metrics_address_from_env},
		parse_string_to_bytes_size,
	},
};

use clap::Parser;
use std::env::{set_var, var};
use tokio::sync::watch;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(
	name = "mempool-monitor",
	about = "Watches an EVM node's mempool and reports pending transactions that transfer value.",
	version
)]
struct Cli {
	/// WebSocket endpoint of the node (ws:// or wss://)
	#[arg(long, value_name = "URL")]
	node_url: Option<String>,

	/// Minimum value in ETH a transaction must exceed to be reported (default: 5)
	#[arg(long, value_name = "ETH")]
	threshold: Option<String>,

	/// Only report transactions whose value exceeds the threshold
	#[arg(long)]
	apply_threshold: bool,

	/// Maximum number of transaction lookups running at once (default: 64)
	#[arg(long, value_name = "N")]
	max_concurrent_lookups: Option<usize>,

	/// Timeout of a single transaction lookup in milliseconds (default: 10000)
	#[arg(long, value_name = "MS")]
	lookup_timeout_ms: Option<u64>,

	/// Reconnect attempts after the subscription is lost, 0 disables reconnecting (default: 5)
	#[arg(long, value_name = "N")]
	reconnect_attempts: Option<u32>,

	/// Write logs to file instead of stderr
	#[arg(long)]
	log_file: bool,

	/// Set log level (trace, debug, info, warn, error)
	#[arg(long, value_name = "LEVEL")]
	log_level: Option<String>,

	/// Path to store log files (default: logs/)
	#[arg(long, value_name = "PATH")]
	log_path: Option<String>,

	/// Maximum log file size before rolling (e.g., "1GB", "500MB", "1024KB")
	#[arg(long, value_name = "SIZE", value_parser = parse_string_to_bytes_size)]
	log_max_size: Option<u64>,

	/// Address to start the metrics server on (default: 127.0.0.1:8081)
	#[arg(long, value_name = "HOST:PORT")]
	metrics_address: Option<String>,

	/// Enable metrics server
	#[arg(long)]
	metrics: bool,

	/// Validate the configuration without starting the service
	#[arg(long)]
	check: bool,
}

impl Cli {
	/// Apply CLI options to environment variables, overriding any existing values
	fn apply_to_env(&self) {
		if let Some(node_url) = &self.node_url {
			set_var("NODE_URL", node_url);
		}

		if let Some(threshold) = &self.threshold {
			set_var("VALUE_THRESHOLD", threshold);
		}

		if self.apply_threshold {
			set_var("APPLY_VALUE_THRESHOLD", "true");
		}

		if let Some(max) = self.max_concurrent_lookups {
			set_var("MAX_CONCURRENT_LOOKUPS", max.to_string());
		}

		if let Some(timeout) = self.lookup_timeout_ms {
			set_var("LOOKUP_TIMEOUT_MS", timeout.to_string());
		}

		if let Some(attempts) = self.reconnect_attempts {
			set_var("RECONNECT_MAX_ATTEMPTS", attempts.to_string());
		}

		if self.log_file {
			set_var("LOG_MODE", "file");
		}

		// Set log level from RUST_LOG if it exists
		if let Ok(level) = var("RUST_LOG") {
			set_var("LOG_LEVEL", level);
		}

		if let Some(level) = &self.log_level {
			set_var("LOG_LEVEL", level);
			set_var("RUST_LOG", level);
		}

		if let Some(path) = &self.log_path {
			set_var("LOG_DATA_DIR", path);
		}

		if let Some(max_size) = &self.log_max_size {
			set_var("LOG_MAX_SIZE", max_size.to_string());
		}

		if self.metrics {
			set_var("METRICS_ENABLED", "true");
		}

		if let Some(address) = &self.metrics_address {
			set_var("METRICS_ADDRESS", address);
		}
	}
}

/// Main entry point for the mempool monitoring service.
///
/// # Errors
/// Returns an error if the configuration is invalid, the node cannot be reached, or the
/// subscription is lost and cannot be re-established.
#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	// A missing .env is fine, a malformed one is not
	load_env_file()?;
	cli.apply_to_env();

	setup_logging().unwrap_or_else(|e| {
		error!("Failed to setup logging: {}", e);
	});

	let config = MonitorConfig::from_env()
		.map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

	if cli.check {
		info!(
			node_url = %config.node_url,
			threshold = %config.value_threshold,
			apply_threshold = config.apply_value_threshold,
			"Configuration is valid"
		);
		return Ok(());
	}

	let watcher = initialize_services(&config)
		.map_err(|e| anyhow::anyhow!("Failed to initialize services: {}", e))?;

	let metrics_enabled =
		cli.metrics || var("METRICS_ENABLED").map(|v| v == "true").unwrap_or(false);

	let metrics_address = metrics_address_from_env();

	let metrics_server = if metrics_enabled {
		info!("Metrics server enabled, starting on {}", metrics_address);
		match create_metrics_server(metrics_address) {
			Ok(server) => Some(server),
			Err(e) => {
				error!("Failed to create metrics server: {}", e);
				None
			}
		}
	} else {
		info!("Metrics server disabled. Use --metrics flag or METRICS_ENABLED=true to enable");
		None
	};
	let metrics_handle = metrics_server.as_ref().map(|server| server.handle());

	let metrics = async move {
		if let Some(server) = metrics_server {
			match server.await {
				Ok(()) => warn!("Metrics server stopped"),
				Err(e) => error!("Metrics server error: {}", e),
			}
		}
		std::future::pending::<()>().await
	};

	let (shutdown_tx, shutdown_rx) = watch::channel(false);
	let run = watcher.run(shutdown_rx);
	tokio::pin!(run);
	tokio::pin!(metrics);

	let result = tokio::select! {
		result = &mut run => result,
		_ = tokio::signal::ctrl_c() => {
			info!("Shutdown signal received, stopping services...");
			let _ = shutdown_tx.send(true);
			run.await
		}
		_ = &mut metrics => Ok(()),
	};

	if let Some(handle) = metrics_handle {
		handle.stop(true).await;
	}

	let stats = watcher.stats().snapshot();
	info!(
		received = stats.received,
		reported = stats.reported,
		filtered = stats.filtered,
		not_found = stats.not_found,
		failed = stats.failed,
		timed_out = stats.timed_out,
		reconnects = stats.reconnects,
		"Watcher stopped"
	);

	result.map_err(|e| anyhow::anyhow!("Mempool watcher stopped: {}", e))?;

	info!("Shutdown complete");
	Ok(())
}
