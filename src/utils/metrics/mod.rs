//! Metrics module for the application.
//!
//! - This module contains the global Prometheus registry.
//! - Defines the pipeline counters and the system gauges.

pub mod server;
use lazy_static::lazy_static;
use prometheus::{Encoder, Gauge, IntCounter, IntGauge, Registry, TextEncoder};
use sysinfo::{Disks, System};

lazy_static! {
	/// Global Prometheus registry.
	///
	/// This registry holds all metrics defined in this module and is used
	/// to gather metrics for exposure via the metrics endpoint.
	pub static ref REGISTRY: Registry = Registry::new();

	/// Gauge for CPU usage percentage.
	pub static ref CPU_USAGE: Gauge = {
		let gauge = Gauge::new("cpu_usage_percentage", "Current CPU usage percentage").unwrap();
		REGISTRY.register(Box::new(gauge.clone())).unwrap();
		gauge
	};

	/// Gauge for memory usage percentage.
	pub static ref MEMORY_USAGE_PERCENT: Gauge = {
		let gauge = Gauge::new("memory_usage_percentage", "Memory usage percentage").unwrap();
		REGISTRY.register(Box::new(gauge.clone())).unwrap();
		gauge
	};

	/// Gauge for memory usage in bytes.
	pub static ref MEMORY_USAGE: Gauge = {
		let gauge = Gauge::new("memory_usage_bytes", "Memory usage in bytes").unwrap();
		REGISTRY.register(Box::new(gauge.clone())).unwrap();
		gauge
	};

	/// Gauge for total memory in bytes.
	pub static ref TOTAL_MEMORY: Gauge = {
		let gauge = Gauge::new("total_memory_bytes", "Total memory in bytes").unwrap();
		REGISTRY.register(Box::new(gauge.clone())).unwrap();
		gauge
	};

	/// Gauge for used disk space in bytes, summed over all mounted filesystems.
	pub static ref DISK_USAGE: Gauge = {
		let gauge = Gauge::new("disk_usage_bytes", "Used disk space in bytes").unwrap();
		REGISTRY.register(Box::new(gauge.clone())).unwrap();
		gauge
	};

	/// Transaction hashes received from the pending transaction subscription.
	pub static ref PENDING_TRANSACTIONS_RECEIVED: IntCounter = {
		let counter = IntCounter::new(
			"pending_transactions_received_total",
			"Pending transaction hashes received from the node"
		).unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};

	/// Reports written to standard output.
	pub static ref REPORTS_EMITTED: IntCounter = {
		let counter = IntCounter::new("reports_emitted_total", "Transaction reports written").unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};

	/// Transactions dropped by the value filter (missing, zero or below threshold).
	pub static ref TRANSACTIONS_FILTERED: IntCounter = {
		let counter = IntCounter::new(
			"transactions_filtered_total",
			"Transactions dropped by the value filter"
		).unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};

	/// Lookups for which the node returned no transaction.
	pub static ref TRANSACTIONS_NOT_FOUND: IntCounter = {
		let counter = IntCounter::new(
			"transactions_not_found_total",
			"Lookups for which the node returned null"
		).unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};

	/// Lookups or presentations that ended with an error.
	pub static ref TRANSACTION_FAILURES: IntCounter = {
		let counter = IntCounter::new(
			"transaction_failures_total",
			"Transactions whose lookup or presentation failed"
		).unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};

	pub static ref LOOKUPS_TIMED_OUT: IntCounter = {
		let counter = IntCounter::new(
			"lookups_timed_out_total",
			"Transaction lookups that exceeded the lookup timeout"
		).unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};

	/// Successful re-subscriptions after the subscription was lost.
	pub static ref SUBSCRIPTION_RECONNECTS: IntCounter = {
		let counter = IntCounter::new(
			"subscription_reconnects_total",
			"Times the pending transaction subscription was re-established"
		).unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};

	/// Lookups currently running.
	pub static ref LOOKUPS_IN_FLIGHT: IntGauge = {
		let gauge = IntGauge::new("lookups_in_flight", "Transaction lookups currently running").unwrap();
		REGISTRY.register(Box::new(gauge.clone())).unwrap();
		gauge
	};
}

/// Gather all metrics and encode into the provided format.
pub fn gather_metrics() -> Result<Vec<u8>, Box<dyn std::error::Error>> {
	let encoder = TextEncoder::new();
	let metric_families = REGISTRY.gather();
	let mut buffer = Vec::new();
	encoder.encode(&metric_families, &mut buffer)?;
	Ok(buffer)
}

/// Updates the system metrics for CPU, memory and disk usage.
pub fn update_system_metrics() {
	let mut sys = System::new_all();
	sys.refresh_all();

	CPU_USAGE.set(sys.global_cpu_usage() as f64);

	let total_memory = sys.total_memory();
	let memory_usage = sys.used_memory();
	TOTAL_MEMORY.set(total_memory as f64);
	MEMORY_USAGE.set(memory_usage as f64);
	MEMORY_USAGE_PERCENT.set(if total_memory > 0 {
		(memory_usage as f64 / total_memory as f64) * 100.0
	} else {
		0.0
	});

	let disks = Disks::new_with_refreshed_list();
	let used_disk_space: u64 = disks
		.list()
		.iter()
		.map(|disk| disk.total_space().saturating_sub(disk.available_space()))
		.sum();
	DISK_USAGE.set(used_disk_space as f64);
}
