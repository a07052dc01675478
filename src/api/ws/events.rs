//! Wire event types for the push stream
//!
//! Every outbound message is an envelope `{type, data}` (adjacently tagged
//! enum). Consumers must treat unknown `type` values as ignorable; this side
//! ignores unparsable inbound messages the same way.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{LogEntry, UnitView};

/// Outbound wire message: `{"type": ..., "data": ...}`
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Full snapshot of a channel's state, pushed on connect/subscribe
    Init(InitSnapshot),
    /// Partial delta for one unit
    UnitUpdate(UnitView),
    /// One log line
    Log(LogEventData),
    /// A unit's logs were cleared
    LogsCleared(LogsClearedData),
    /// A unit's content was rolled back to a stored version
    UnitRolledBack(RolledBackData),
    /// A unit left the roster
    UnitRemoved(UnitRemovedData),
    /// Lightweight per-unit metadata delta
    StatsUpdate(UnitStats),
    /// Periodic system telemetry
    Metrics(MetricsSnapshot),
    /// Welcome message, first frame on every connection
    Connected(ConnectedData),
    Ping,
    Pong,
}

/// Snapshot payload; fields are filled per channel kind
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InitSnapshot {
    pub channel: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<Vec<UnitView>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<UnitStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logs: Option<Vec<LogEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricsSnapshot>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogEventData {
    #[serde(rename = "unitId")]
    pub unit_id: String,
    #[serde(flatten)]
    pub entry: LogEntry,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogsClearedData {
    #[serde(rename = "unitId")]
    pub unit_id: String,
    /// Sequence of the system marker appended by the clear
    #[serde(rename = "markerSequence")]
    pub marker_sequence: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RolledBackData {
    #[serde(rename = "unitId")]
    pub unit_id: String,
    pub version: u64,
    #[serde(rename = "savedCurrentAs", skip_serializing_if = "Option::is_none")]
    pub saved_current_as: Option<u64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UnitRemovedData {
    #[serde(rename = "unitId")]
    pub unit_id: String,
}

/// Per-unit metadata carried on `stats:<unitId>`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UnitStats {
    #[serde(rename = "unitId")]
    pub unit_id: String,
    #[serde(rename = "logCount")]
    pub log_count: u64,
    #[serde(rename = "logFileSize")]
    pub log_file_size: u64,
    #[serde(rename = "versionCount")]
    pub version_count: usize,
    /// Egress-cache summary relayed verbatim from the network module
    #[serde(skip_serializing_if = "Option::is_none")]
    pub egress: Option<Value>,
}

/// System telemetry published on the `metrics` channel
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: u64,
    #[serde(rename = "uptimeSecs")]
    pub uptime_secs: u64,
    #[serde(rename = "unitsTotal")]
    pub units_total: usize,
    #[serde(rename = "unitsRunning")]
    pub units_running: usize,
    #[serde(rename = "unitsError")]
    pub units_error: usize,
    #[serde(rename = "totalLogEntries")]
    pub total_log_entries: u64,
    /// Nominal publish cadence, lets clients detect a stalled stream
    #[serde(rename = "intervalSecs")]
    pub interval_secs: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConnectedData {
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

/// Inbound messages from the client
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Subscribe to a channel (idempotent)
    Subscribe { channel: String },
    /// Unsubscribe from a channel (idempotent)
    Unsubscribe { channel: String },
    /// Heartbeat
    Ping,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LogLevel, UnitStatus};

    #[test]
    fn test_envelope_shape() {
        let event = ServerEvent::LogsCleared(LogsClearedData {
            unit_id: "u1".to_string(),
            marker_sequence: 9,
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "logsCleared");
        assert_eq!(json["data"]["unitId"], "u1");
        assert_eq!(json["data"]["markerSequence"], 9);
    }

    #[test]
    fn test_unit_tagged_ping() {
        let json = serde_json::to_string(&ServerEvent::Ping).unwrap();
        assert_eq!(json, r#"{"type":"ping"}"#);
    }

    #[test]
    fn test_log_event_inlines_entry() {
        let event = ServerEvent::Log(LogEventData {
            unit_id: "u1".to_string(),
            entry: LogEntry {
                sequence: 3,
                timestamp: 100,
                message: "hi".to_string(),
                level: LogLevel::Info,
            },
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "log");
        assert_eq!(json["data"]["sequence"], 3);
        assert_eq!(json["data"]["message"], "hi");
    }

    #[test]
    fn test_client_message_parsing() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"subscribe","channel":"logs:u1"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Subscribe { channel } if channel == "logs:u1"));

        let msg: ClientMessage = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Ping));
    }

    #[test]
    fn test_init_skips_empty_sections() {
        let event = ServerEvent::Init(InitSnapshot {
            channel: "global".to_string(),
            units: Some(vec![UnitView {
                id: "u1".to_string(),
                name: "n".to_string(),
                status: UnitStatus::Stopped,
                intended_state: crate::types::IntendedState::Stopped,
                connected: false,
                last_start_time: 0,
                restart_attempts: 0,
                log_count: 0,
            }]),
            ..Default::default()
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "init");
        assert!(json["data"].get("logs").is_none());
        assert!(json["data"]["units"].is_array());
    }
}
