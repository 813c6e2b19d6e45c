//! Bootstrap module for initializing services.
//!
//! Wires the configuration into the services making up the monitor:
//! - `ValueFilter`: Decides which transactions are reported
//! - `ReportNotifier`: Writes reports to standard output
//! - `MempoolWatcherService`: Subscription loop dialing the node through a connector

use futures::future::BoxFuture;
use std::{error::Error, path::Path, sync::Arc};
use url::Url;

use crate::{
	models::{ConfigError, MonitorConfig},
	services::{
		blockchain::{BlockChainError, EvmClient},
		filter::{FilterError, ValueFilter},
		mempoolwatcher::{MempoolWatcherService, WatcherSettings},
		notification::ReportNotifier,
	},
};

/// Type alias for handling ServiceResult
pub type Result<T> = std::result::Result<T, Box<dyn Error>>;

/// Connector dialing the node and returning a fresh client
pub type EvmConnector =
	dyn Fn() -> BoxFuture<'static, std::result::Result<EvmClient, BlockChainError>> + Send + Sync;

/// Watcher as assembled for the binary
pub type MonitorWatcher<W = std::io::Stdout> =
	MempoolWatcherService<EvmClient, ReportNotifier<W>, EvmConnector>;

/// Loads a `.env` file from the working directory.
///
/// A missing file is not an error, a file that cannot be parsed is.
///
/// # Returns
/// * `Ok(true)` if a file was loaded, `Ok(false)` if there is none
pub fn load_env_file() -> std::result::Result<bool, ConfigError> {
	handle_env_result(dotenvy::dotenv_override().map(|_| ()))
}

/// Loads the given `.env` file, overriding existing variables.
///
/// Same rules as [`load_env_file`].
pub fn load_env_file_from(path: &Path) -> std::result::Result<bool, ConfigError> {
	handle_env_result(dotenvy::from_path_override(path))
}

fn handle_env_result(
	result: std::result::Result<(), dotenvy::Error>,
) -> std::result::Result<bool, ConfigError> {
	match result {
		Ok(()) => Ok(true),
		Err(e) if e.not_found() => Ok(false),
		Err(e) => Err(e.into()),
	}
}

/// Creates the connector used for the first connection and every reconnect attempt
pub fn create_connector(node_url: Url) -> Arc<EvmConnector> {
	Arc::new(
		move || -> BoxFuture<'static, std::result::Result<EvmClient, BlockChainError>> {
			let node_url = node_url.clone();
			Box::pin(async move { EvmClient::connect(&node_url).await })
		},
	)
}

/// Initializes the services required by the monitor.
///
/// # Arguments
/// * `config` - Validated monitor configuration
///
/// # Returns
/// * `Result<MonitorWatcher, FilterError>` - The watcher, ready to [`run`](MempoolWatcherService::run)
///
/// # Errors
/// Returns an error if the value filter rejects the configured threshold
pub fn initialize_services(
	config: &MonitorConfig,
) -> std::result::Result<MonitorWatcher, FilterError> {
	initialize_services_with_output(config, std::io::stdout())
}

/// Same as [`initialize_services`] with reports written to `output`
pub fn initialize_services_with_output<W>(
	config: &MonitorConfig,
	output: W,
) -> std::result::Result<MonitorWatcher<W>, FilterError>
where
	W: std::io::Write + Send + 'static,
{
	let filter = ValueFilter::from_config(config)?;
	let notifier = Arc::new(ReportNotifier::new(output, filter));
	let connector = create_connector(config.node_url.clone());

	Ok(MempoolWatcherService::new(
		connector,
		notifier,
		WatcherSettings::from(config),
	))
}
