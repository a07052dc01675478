//! Server configuration
//!
//! [`ServerConfig`] carries the data directory layout and every tunable the
//! supervisor and the stores need. All on-disk paths are derived from
//! `data_dir` through the helper methods so the layout is defined in one place:
//!
//! ```text
//! data/
//!   units.json                  durable unit registry (intended state)
//!   units/<id>/
//!     current                   live script content
//!     logs.jsonl                file-backed log overflow
//!     versions/v<N>             numbered content snapshots
//!     versions/index.json       version metadata index
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for the runhub server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Path to the data directory
    pub data_dir: PathBuf,
    /// Bind address for the HTTP/WebSocket server
    pub bind_addr: String,
    /// Interpreter used to run unit scripts
    pub interpreter: String,
    /// In-memory log entries retained per unit
    pub log_memory_capacity: usize,
    /// Log file size threshold that triggers rotation (bytes)
    pub log_rotate_threshold: u64,
    /// Entries kept in the log file after rotation
    pub log_rotate_keep: usize,
    /// Grace period before a stop escalates to a forced kill
    pub stop_grace: Duration,
    /// Units started concurrently per reconciliation batch
    pub reconcile_batch_size: usize,
    /// Per-unit wait for the connection handshake during reconciliation
    pub connection_timeout: Duration,
    /// First delay of the crash auto-restart backoff
    pub restart_backoff_first: Duration,
    /// Cap for the crash auto-restart backoff
    pub restart_backoff_max: Duration,
    /// Maximum consecutive auto-restart attempts
    pub restart_max_attempts: u32,
    /// Cadence of the telemetry publisher on the metrics channel
    pub metrics_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            bind_addr: "127.0.0.1:8420".to_string(),
            interpreter: "python3".to_string(),
            log_memory_capacity: 100,
            log_rotate_threshold: 1024 * 1024,
            log_rotate_keep: 500,
            stop_grace: Duration::from_secs(5),
            reconcile_batch_size: 5,
            connection_timeout: Duration::from_secs(10),
            restart_backoff_first: Duration::from_secs(1),
            restart_backoff_max: Duration::from_secs(60),
            restart_max_attempts: 5,
            metrics_interval: Duration::from_secs(5),
        }
    }
}

impl ServerConfig {
    /// Create config with custom data directory
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    /// Create config with custom data directory (alias for new)
    pub fn with_data_dir<P: AsRef<Path>>(data_dir: P) -> Self {
        Self::new(data_dir)
    }

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Get path to the durable unit registry
    pub fn registry_path(&self) -> PathBuf {
        self.data_dir.join("units.json")
    }

    /// Get the per-unit directory
    pub fn unit_dir(&self, unit_id: &str) -> PathBuf {
        self.data_dir.join("units").join(unit_id)
    }

    /// Get path to a unit's live script content
    pub fn current_path(&self, unit_id: &str) -> PathBuf {
        self.unit_dir(unit_id).join("current")
    }

    /// Get path to a unit's log overflow file
    pub fn log_path(&self, unit_id: &str) -> PathBuf {
        self.unit_dir(unit_id).join("logs.jsonl")
    }

    /// Get a unit's version snapshot directory
    pub fn versions_dir(&self, unit_id: &str) -> PathBuf {
        self.unit_dir(unit_id).join("versions")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_derive_from_data_dir() {
        let config = ServerConfig::with_data_dir("/tmp/hub");
        assert_eq!(config.registry_path(), PathBuf::from("/tmp/hub/units.json"));
        assert_eq!(
            config.log_path("u1"),
            PathBuf::from("/tmp/hub/units/u1/logs.jsonl")
        );
        assert_eq!(
            config.versions_dir("u1"),
            PathBuf::from("/tmp/hub/units/u1/versions")
        );
    }
}
