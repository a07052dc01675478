//! Unit status, intended state and the durable unit record

use serde::{Deserialize, Serialize};

use super::is_zero;

/// Observed run state of a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitStatus {
    Stopped,
    Starting,
    Running,
    Stopping,
    Error,
}

/// Durable target run state. The sole input to boot reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntendedState {
    Stopped,
    Running,
}

/// Durable per-unit record persisted in `units.json`
///
/// Only configuration lives here; observed state (status, process handle,
/// sequence counters) is rebuilt at boot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "intendedState")]
    pub intended_state: IntendedState,
    /// Whether a crash should trigger auto-restart with backoff
    #[serde(rename = "autoRestart", default)]
    pub auto_restart: bool,
    #[serde(rename = "createdAt", default, skip_serializing_if = "is_zero")]
    pub created_at: u64,
}

impl UnitRecord {
    pub fn new(id: String, name: String) -> Self {
        Self {
            id,
            name,
            intended_state: IntendedState::Stopped,
            auto_restart: false,
            created_at: crate::utils::current_timestamp(),
        }
    }
}

/// Snapshot of a unit as exposed to clients (`init` / `unitUpdate` payloads)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitView {
    pub id: String,
    pub name: String,
    pub status: UnitStatus,
    #[serde(rename = "intendedState")]
    pub intended_state: IntendedState,
    pub connected: bool,
    #[serde(rename = "lastStartTime", default, skip_serializing_if = "is_zero")]
    pub last_start_time: u64,
    #[serde(rename = "restartAttempts")]
    pub restart_attempts: u32,
    #[serde(rename = "logCount")]
    pub log_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&UnitStatus::Starting).unwrap();
        assert_eq!(json, "\"starting\"");
    }

    #[test]
    fn test_record_round_trip() {
        let record = UnitRecord::new("u1".to_string(), "collector".to_string());
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("intendedState"));

        let parsed: UnitRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, "u1");
        assert_eq!(parsed.intended_state, IntendedState::Stopped);
    }
}
