//! Constants used across the monitor.

use std::time::Duration;

/// Number of wei in one gwei (sub-unit used for gas prices).
pub const WEI_PER_GWEI: u64 = 1_000_000_000;

/// Decimal places between wei and ether.
pub const ETHER_DECIMALS: u32 = 18;

/// Default minimum value, in ether, a transaction must exceed when the threshold is applied.
pub const DEFAULT_VALUE_THRESHOLD: u64 = 5;

/// Default upper bound of concurrently running transaction lookups.
pub const DEFAULT_MAX_CONCURRENT_LOOKUPS: usize = 64;

/// Default timeout for a single `eth_getTransactionByHash` call.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Default number of reconnect attempts after the subscription is lost.
pub const DEFAULT_RECONNECT_MAX_ATTEMPTS: u32 = 5;

pub const DEFAULT_RECONNECT_INITIAL_BACKOFF: Duration = Duration::from_millis(500);

pub const DEFAULT_RECONNECT_MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Time given to in-flight lookups to finish once shutdown is requested.
pub const DEFAULT_SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Capacity of the channel between the node subscription and the watcher loop.
pub const SUBSCRIPTION_CHANNEL_CAPACITY: usize = 1024;

pub const DEFAULT_LOG_DIR: &str = "logs/";

pub const DEFAULT_LOG_FILE_NAME: &str = "mempool-monitor.log";

/// 1 GiB
pub const DEFAULT_LOG_MAX_SIZE: u64 = 1_073_741_824;

pub const DEFAULT_METRICS_ADDRESS: &str = "127.0.0.1:8081";
