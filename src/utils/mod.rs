//! Utility functions and helpers
//!
//! Atomic file writes and timestamp helpers used by the stores.

pub mod atomic;
pub mod time;

pub use atomic::{atomic_write, atomic_write_with, cleanup_temp_files};
pub use time::{current_timestamp, format_clock};
