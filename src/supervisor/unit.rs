//! Unit: one managed script, its process handle, logs and versions
//!
//! A [`Unit`] is a passive state holder. All orchestration (spawning,
//! stopping, crash handling) funnels through the supervisor; the unit owns
//! the pieces: the exclusive OS process handle, the log store, the version
//! store, and the observed state machine.
//!
//! State machine:
//!
//! ```text
//! stopped --start--> starting --spawn ok--> running
//! running --exit(0)--> stopped      running --exit(!=0)--> error
//! running --stop--> stopping --terminated--> stopped
//! ```

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use tokio::process::Child;

use crate::logstore::LogStore;
use crate::types::{IntendedState, UnitRecord, UnitStatus, UnitView};
use crate::versions::VersionStore;

/// One managed script and its runtime state
pub struct Unit {
    record: RwLock<UnitRecord>,
    status: RwLock<UnitStatus>,
    connected: AtomicBool,
    last_start_time: AtomicU64,
    restart_attempts: AtomicU32,
    last_error: Mutex<Option<String>>,
    /// Latest egress-cache summary relayed from the network module
    egress_stats: Mutex<Option<serde_json::Value>>,
    /// Incremented on every spawn so stale monitor tasks can bail out
    spawn_epoch: AtomicU64,
    /// Exclusively owned process handle; present only while live
    pub(crate) child: tokio::sync::Mutex<Option<Child>>,
    pub(crate) logs: Mutex<LogStore>,
    pub(crate) versions: Mutex<VersionStore>,
}

impl Unit {
    pub fn new(record: UnitRecord, logs: LogStore, versions: VersionStore) -> Self {
        Self {
            record: RwLock::new(record),
            status: RwLock::new(UnitStatus::Stopped),
            connected: AtomicBool::new(false),
            last_start_time: AtomicU64::new(0),
            restart_attempts: AtomicU32::new(0),
            last_error: Mutex::new(None),
            egress_stats: Mutex::new(None),
            spawn_epoch: AtomicU64::new(0),
            child: tokio::sync::Mutex::new(None),
            logs: Mutex::new(logs),
            versions: Mutex::new(versions),
        }
    }

    pub fn id(&self) -> String {
        self.record.read().id.clone()
    }

    pub fn record(&self) -> UnitRecord {
        self.record.read().clone()
    }

    pub fn rename(&self, name: String) {
        self.record.write().name = name;
    }

    pub fn intended_state(&self) -> IntendedState {
        self.record.read().intended_state
    }

    pub fn set_intended_state(&self, state: IntendedState) {
        self.record.write().intended_state = state;
    }

    pub fn auto_restart(&self) -> bool {
        self.record.read().auto_restart
    }

    pub fn status(&self) -> UnitStatus {
        *self.status.read()
    }

    pub fn set_status(&self, status: UnitStatus) {
        *self.status.write() = status;
    }

    pub fn connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Set the handshake flag; a fresh connection resets the crash counter
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
        if connected {
            self.restart_attempts.store(0, Ordering::SeqCst);
        }
    }

    pub fn restart_attempts(&self) -> u32 {
        self.restart_attempts.load(Ordering::SeqCst)
    }

    /// Increment and return the crash counter (pre-increment value)
    pub fn bump_restart_attempts(&self) -> u32 {
        self.restart_attempts.fetch_add(1, Ordering::SeqCst)
    }

    pub fn reset_restart_attempts(&self) {
        self.restart_attempts.store(0, Ordering::SeqCst);
    }

    pub fn set_last_error(&self, error: Option<String>) {
        *self.last_error.lock() = error;
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }

    pub fn set_egress_stats(&self, stats: serde_json::Value) {
        *self.egress_stats.lock() = Some(stats);
    }

    pub fn egress_stats(&self) -> Option<serde_json::Value> {
        self.egress_stats.lock().clone()
    }

    pub fn mark_started(&self) {
        self.last_start_time
            .store(crate::utils::current_timestamp(), Ordering::SeqCst);
    }

    /// Current spawn epoch; bumped by the supervisor on every spawn
    pub(crate) fn spawn_epoch(&self) -> u64 {
        self.spawn_epoch.load(Ordering::SeqCst)
    }

    pub(crate) fn bump_spawn_epoch(&self) -> u64 {
        self.spawn_epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Whether a live process handle exists right now
    pub async fn has_live_handle(&self) -> bool {
        self.child.lock().await.is_some()
    }

    /// Client-facing snapshot
    pub fn view(&self) -> UnitView {
        let record = self.record.read();
        UnitView {
            id: record.id.clone(),
            name: record.name.clone(),
            status: self.status(),
            intended_state: record.intended_state,
            connected: self.connected(),
            last_start_time: self.last_start_time.load(Ordering::SeqCst),
            restart_attempts: self.restart_attempts(),
            log_count: self.logs.lock().total_count(),
        }
    }
}
