use std::{str::FromStr, sync::Arc};

use alloy::primitives::{TxHash, U256};
use rust_decimal::Decimal;
use serde_json::json;

use crate::integration::mocks::SharedBuffer;
use mempool_monitor::{
	services::{
		filter::{SkipReason, ValueFilter},
		notification::{Notifier, Presentation, ReportNotifier, REPORT_BANNER},
	},
	utils::tests::builders::evm::transaction::TransactionBuilder,
};

fn ether(value: &str) -> U256 {
	let wei = Decimal::from_str(value).unwrap() * Decimal::from(1_000_000_000_000_000_000u64);
	U256::from_str(&wei.trunc().to_string()).unwrap()
}

fn notifier(threshold: &str, apply: bool) -> (ReportNotifier<SharedBuffer>, SharedBuffer) {
	let output = SharedBuffer::new();
	let filter = ValueFilter::new(Decimal::from_str(threshold).unwrap(), apply).unwrap();
	(ReportNotifier::new(output.clone(), filter), output)
}

#[test]
fn test_reference_transaction_report() {
	let (notifier, output) = notifier("5", false);
	let transaction = serde_json::from_value(json!({
		"hash": "0xabc",
		"from": "0x1",
		"to": "0x2",
		"value": "0xde0b6b3a7640000",
		"gasPrice": "0x3b9aca00"
	}))
	.unwrap();

	let presentation = notifier.present(&transaction).unwrap();

	assert_eq!(presentation, Presentation::Emitted);
	assert_eq!(
		output.contents(),
		"*** NEW TX DETECTED ***\nTX HASH: 0xabc\nFROM: 0x1\nTO: 0x2\nGAS PRICE: 1 Gwei\nETH: 1\n"
	);
}

#[test]
fn test_threshold_is_exclusive_when_applied() {
	let (notifier, output) = notifier("5", true);

	let at_threshold = TransactionBuilder::new().value(ether("5")).build();
	let above_threshold = TransactionBuilder::new()
		.value(ether("5") + U256::from(1))
		.build();

	assert_eq!(
		notifier.present(&at_threshold).unwrap(),
		Presentation::Skipped(SkipReason::BelowThreshold)
	);
	assert_eq!(notifier.present(&above_threshold).unwrap(), Presentation::Emitted);
	assert_eq!(output.report_count(), 1);
	assert!(output.contents().contains("ETH: 5.000000000000000001\n"));
}

#[test]
fn test_threshold_is_ignored_unless_applied() {
	let (notifier, output) = notifier("5", false);
	let small = TransactionBuilder::new().value(ether("0.25")).build();

	assert_eq!(notifier.present(&small).unwrap(), Presentation::Emitted);
	assert!(output.contents().contains("ETH: 0.25\n"));
}

#[test]
fn test_values_beyond_96_bits_are_reported_exactly() {
	let (notifier, output) = notifier("5", true);
	let transaction = TransactionBuilder::new()
		.value(U256::from(1u128 << 96))
		.build();

	assert_eq!(notifier.present(&transaction).unwrap(), Presentation::Emitted);
	assert!(output
		.contents()
		.ends_with("ETH: 79228162514.264337593543950336\n"));
}

#[test]
fn test_missing_or_mistyped_value_is_skipped() {
	let (notifier, output) = notifier("5", false);

	let missing = TransactionBuilder::new().without("value").build();
	let mistyped = TransactionBuilder::new().value_raw(json!(42)).build();

	assert_eq!(
		notifier.present(&missing).unwrap(),
		Presentation::Skipped(SkipReason::MissingValue)
	);
	assert_eq!(
		notifier.present(&mistyped).unwrap(),
		Presentation::Skipped(SkipReason::MissingValue)
	);
	assert!(output.contents().is_empty());
}

#[test]
fn test_malformed_gas_price_still_reports() {
	let (notifier, output) = notifier("5", false);
	let transaction = TransactionBuilder::new()
		.value(ether("2"))
		.gas_price_raw(json!("0xnothex"))
		.build();

	assert_eq!(notifier.present(&transaction).unwrap(), Presentation::Emitted);

	let contents = output.contents();
	assert!(contents.starts_with("Invalid gas price\n"));
	assert!(!contents.contains("GAS PRICE:"));
	assert!(contents.contains("ETH: 2\n"));
}

#[test]
fn test_concurrent_reports_do_not_interleave() {
	let (notifier, output) = notifier("5", false);
	let notifier = Arc::new(notifier);

	let threads: Vec<_> = (1..=8u8)
		.map(|byte| {
			let notifier = notifier.clone();
			std::thread::spawn(move || {
				for _ in 0..25 {
					let transaction = TransactionBuilder::new()
						.hash(TxHash::repeat_byte(byte))
						.value(ether("1"))
						.build();
					notifier.present(&transaction).unwrap();
				}
			})
		})
		.collect();
	for thread in threads {
		thread.join().unwrap();
	}

	let contents = output.contents();
	assert_eq!(output.report_count(), 200);
	for report in contents.split(REPORT_BANNER).skip(1) {
		let lines: Vec<&str> = report.trim_start_matches('\n').lines().collect();
		assert_eq!(lines.len(), 5);
		assert!(lines[0].starts_with("TX HASH: "));
		assert!(lines[1].starts_with("FROM: "));
		assert!(lines[2].starts_with("TO: "));
		assert!(lines[3].starts_with("GAS PRICE: "));
		assert!(lines[4].starts_with("ETH: "));
	}
}
