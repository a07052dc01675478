//! Log entry types

use serde::{Deserialize, Serialize};

/// Severity of a log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Error,
    /// Emitted by the store itself (rotation, clear markers)
    System,
}

/// One log line of a unit
///
/// `sequence` is strictly increasing per unit and never reused, even across
/// rotation or a clear. Subscribers rely on it for gap detection and dedup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub sequence: u64,
    pub timestamp: u64,
    pub message: String,
    pub level: LogLevel,
}

impl LogEntry {
    pub fn new(sequence: u64, message: String, level: LogLevel) -> Self {
        Self {
            sequence,
            timestamp: crate::utils::current_timestamp(),
            message,
            level,
        }
    }

    /// Serialize to a single JSONL line
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parse from a single JSONL line
    pub fn from_json_line(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line)
    }

    /// Plain-text export format: `[HH:MM:SS] message`
    pub fn export_line(&self) -> String {
        format!(
            "[{}] {}",
            crate::utils::format_clock(self.timestamp),
            self.message
        )
    }
}
