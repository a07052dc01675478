//! Runhub Server
//!
//! A script hosting supervisor: users upload small scripts, runhub runs them
//! as long-lived or one-shot child processes, and browsers observe status,
//! logs and metrics live over WebSocket channels.
//!
//! # Modules
//!
//! - `types`: Core data structures (unit status, log entries, version metadata)
//! - `config`: Server configuration and on-disk layout
//! - `error`: Error taxonomy and `Result` alias
//! - `logstore`: Per-unit bounded log ring with file-backed overflow and rotation
//! - `versions`: Per-unit content snapshots, pagination and rollback
//! - `supervisor`: Unit lifecycle, single-flight starts, crash recovery,
//!   intended-state reconciliation
//! - `api`: REST command surface and the WebSocket push layer (event bus,
//!   gateway, client companion policy)
//! - `utils`: Atomic file writes and timestamp helpers
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use runhub::api::ws::EventBus;
//! use runhub::config::ServerConfig;
//! use runhub::supervisor::Supervisor;
//!
//! #[tokio::main]
//! async fn main() -> runhub::error::Result<()> {
//!     let config = ServerConfig::with_data_dir("data");
//!     let bus = Arc::new(EventBus::new());
//!     let supervisor = Supervisor::load(config, bus)?;
//!     let report = supervisor.reconcile_intended_state().await;
//!     println!("reconciled: {} started", report.succeeded);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod logstore;
pub mod supervisor;
pub mod types;
pub mod utils;
pub mod versions;

// Re-export commonly used items at crate root
pub use api::ws::{Channel, EventBus};
pub use config::ServerConfig;
pub use error::{Error, Result};
pub use logstore::LogStore;
pub use supervisor::{ReconcileReport, StartOutcome, Supervisor, Unit};
pub use types::{IntendedState, LogEntry, LogLevel, UnitRecord, UnitStatus, UnitView};
pub use versions::VersionStore;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
