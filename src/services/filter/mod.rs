//! Transaction filtering.
//!
//! A single rule: the transaction must transfer a non-zero value, optionally above a
//! configured threshold.

mod error;
mod value_filter;

pub use error::FilterError;
pub use value_filter::{FilterDecision, SkipReason, ValueFilter};
