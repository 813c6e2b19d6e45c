//! Utility modules for common functionality.
//!
//! - constants: Constants for the application
//! - logging: Logging utilities
//! - metrics: Metrics utilities
//! - parsing: Parsing utilities
//! - units: Wire integer decoding and wei/ether/gwei conversion
//! - tests: Test utilities

pub mod constants;
pub mod logging;
pub mod metrics;
pub mod parsing;
pub mod units;

pub use constants::*;
pub use parsing::*;
