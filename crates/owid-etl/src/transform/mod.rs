//! Wide-to-long normalization of the inflation dataset.
//!
//! ```text
//! raw wide table ──► VariableSelector ──► WideToLongReshaper ──► ReshapeOutcome
//!                    (manifest filter)    (entity × year pivot)   (kept / excluded)
//! ```

mod datapoint;
mod reshape;
mod selector;

pub use datapoint::{LongDatapoint, ReshapeOutcome, validate_partition};
pub use reshape::{ReshapeConfig, WideToLongReshaper, YearColumn};
pub use selector::VariableSelector;
