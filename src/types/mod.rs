//! Data types for the runhub server
//!
//! This module contains the core data structures shared by the supervisor,
//! the stores and the API layer.

mod log;
mod page;
mod unit;
mod version;

pub use log::{LogEntry, LogLevel};
pub use page::PageMeta;
pub use unit::{IntendedState, UnitRecord, UnitStatus, UnitView};
pub use version::{VersionIndex, VersionMeta};

/// Check if value is zero (for skip_serializing_if)
pub fn is_zero(val: &u64) -> bool {
    *val == 0
}
