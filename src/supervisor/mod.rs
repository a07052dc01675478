//! Process supervisor
//!
//! Owns the unit registry and every lifecycle transition: spawn, stop,
//! crash recovery and boot-time reconciliation of intended state. All
//! registry mutation funnels through here; the durable `units.json` is
//! rewritten in full after each mutation, making the supervisor the single
//! writer of truth.
//!
//! Start calls are single-flight per unit: an in-flight map from unit id to
//! a shared future, so concurrent callers attach to the same attempt. Each
//! entry removes itself on settlement, success or failure, so cleanup never
//! depends on any particular caller surviving to clean up.

mod backoff;
mod store;
mod unit;

pub use backoff::RestartBackoff;
pub use store::RegistryStore;
pub use unit::Unit;

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::time::{sleep, timeout};
use tracing::{info, warn};

use crate::api::ws::{Channel, EventBus};
use crate::api::ws::events::{
    InitSnapshot, LogEventData, LogsClearedData, MetricsSnapshot, RolledBackData, ServerEvent,
    UnitStats,
};
use crate::config::ServerConfig;
use crate::error::{Error, Result};
use crate::logstore::LogStore;
use crate::types::{IntendedState, LogEntry, LogLevel, PageMeta, UnitRecord, UnitStatus, UnitView, VersionMeta};
use crate::versions::{RollbackOutcome, VersionStore};

/// Result of a start call
#[derive(Debug, Clone, Serialize)]
pub struct StartOutcome {
    /// True when a live handle already existed and nothing was done
    #[serde(rename = "alreadyRunning")]
    pub already_running: bool,
}

/// One failed unit inside a reconciliation run
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileFailure {
    pub id: String,
    pub error: String,
}

/// Accumulated outcome of one reconciliation run. A single unit's failure
/// never aborts the batch or the overall call.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconcileReport {
    #[serde(rename = "shouldBeRunning")]
    pub should_be_running: usize,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: Vec<ReconcileFailure>,
    #[serde(rename = "alreadyRunning")]
    pub already_running: usize,
    pub connected: usize,
    #[serde(rename = "connectionTimeouts")]
    pub connection_timeouts: usize,
}

type SharedStart = Shared<BoxFuture<'static, std::result::Result<StartOutcome, Arc<Error>>>>;

/// Registry of units plus start/stop orchestration
pub struct Supervisor {
    config: ServerConfig,
    bus: Arc<EventBus>,
    units: parking_lot::RwLock<HashMap<String, Arc<Unit>>>,
    /// In-flight start attempts, keyed by unit id; entries remove themselves
    /// on settlement
    starting: tokio::sync::Mutex<HashMap<String, SharedStart>>,
    registry: RegistryStore,
    backoff: RestartBackoff,
    started_at: Instant,
}

impl Supervisor {
    /// Load the durable registry and rebuild the unit map
    pub fn load(config: ServerConfig, bus: Arc<EventBus>) -> Result<Arc<Self>> {
        let _ = crate::utils::cleanup_temp_files(config.data_dir());
        let registry = RegistryStore::new(config.registry_path());
        let records = registry.load()?;

        let backoff = RestartBackoff {
            first: config.restart_backoff_first,
            max: config.restart_backoff_max,
            factor: 2.0,
            max_attempts: config.restart_max_attempts,
        };

        let mut units = HashMap::new();
        for record in records {
            let unit = Self::open_unit(&config, record)?;
            units.insert(unit.id(), Arc::new(unit));
        }
        info!(units = units.len(), "unit registry loaded");

        Ok(Arc::new(Self {
            config,
            bus,
            units: parking_lot::RwLock::new(units),
            starting: tokio::sync::Mutex::new(HashMap::new()),
            registry,
            backoff,
            started_at: Instant::now(),
        }))
    }

    fn open_unit(config: &ServerConfig, record: UnitRecord) -> Result<Unit> {
        let logs = LogStore::open(
            config.log_path(&record.id),
            config.log_memory_capacity,
            config.log_rotate_threshold,
            config.log_rotate_keep,
        )?;
        let versions =
            VersionStore::open(config.versions_dir(&record.id), config.current_path(&record.id))?;
        Ok(Unit::new(record, logs, versions))
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    // ---- registry mutations ------------------------------------------------

    /// Register a new unit with its initial content
    pub fn create_unit(
        self: &Arc<Self>,
        name: &str,
        content: &str,
        auto_restart: bool,
    ) -> Result<UnitView> {
        if name.trim().is_empty() {
            return Err(Error::Validation("unit name must not be empty".to_string()));
        }

        let id = Self::generate_unit_id();
        let mut record = UnitRecord::new(id.clone(), name.to_string());
        record.auto_restart = auto_restart;

        let unit = Arc::new(Self::open_unit(&self.config, record)?);
        unit.versions.lock().save(content)?;
        self.units.write().insert(id.clone(), Arc::clone(&unit));
        self.persist_registry()?;

        info!(unit = %id, name = %name, "unit created");
        self.publish_unit_update(&unit);
        Ok(unit.view())
    }

    /// Stop (if needed) and remove a unit, deleting its on-disk state
    pub async fn delete_unit(self: &Arc<Self>, unit_id: &str) -> Result<()> {
        let unit = self.get_unit(unit_id)?;
        if unit.has_live_handle().await {
            self.stop(unit_id).await?;
        }

        self.units.write().remove(unit_id);
        self.persist_registry()?;
        let _ = std::fs::remove_dir_all(self.config.unit_dir(unit_id));

        info!(unit = %unit_id, "unit deleted");
        let _ = self.bus.publish(
            &Channel::Global,
            ServerEvent::UnitRemoved(crate::api::ws::events::UnitRemovedData {
                unit_id: unit_id.to_string(),
            }),
        );
        Ok(())
    }

    pub fn rename_unit(self: &Arc<Self>, unit_id: &str, name: &str) -> Result<UnitView> {
        if name.trim().is_empty() {
            return Err(Error::Validation("unit name must not be empty".to_string()));
        }
        let unit = self.get_unit(unit_id)?;
        unit.rename(name.to_string());
        self.persist_registry()?;
        self.publish_unit_update(&unit);
        Ok(unit.view())
    }

    /// Commit new content, snapshotting the previous version when it differs
    pub fn update_content(self: &Arc<Self>, unit_id: &str, content: &str) -> Result<Option<VersionMeta>> {
        let unit = self.get_unit(unit_id)?;
        let created = unit.versions.lock().save(content)?;
        self.publish_stats(&unit);
        Ok(created)
    }

    // ---- lifecycle ----------------------------------------------------------

    /// Start a unit. Duplicate starts collapse into `already_running: true`;
    /// concurrent callers for the same id share one attempt.
    ///
    /// Returns a boxed future: the crash-recovery task awaits a restart
    /// through here, and the start → monitor → restart cycle must bottom out
    /// in a concrete future type.
    pub fn start(self: &Arc<Self>, unit_id: &str) -> BoxFuture<'static, Result<StartOutcome>> {
        let sup = Arc::clone(self);
        let id = unit_id.to_string();
        async move { sup.start_inner(&id).await }.boxed()
    }

    async fn start_inner(self: &Arc<Self>, unit_id: &str) -> Result<StartOutcome> {
        let unit = self.get_unit(unit_id)?;
        if unit.has_live_handle().await {
            return Ok(StartOutcome {
                already_running: true,
            });
        }

        let attempt = {
            let mut starting = self.starting.lock().await;
            match starting.get(unit_id) {
                Some(shared) => shared.clone(),
                None => {
                    let sup = Arc::clone(self);
                    let id = unit_id.to_string();
                    let shared: SharedStart = async move {
                        let result = sup.start_attempt(&id).await.map_err(Arc::new);
                        // The entry removes itself on settlement; a caller
                        // cancelled mid-await can never leak it.
                        sup.starting.lock().await.remove(&id);
                        result
                    }
                    .boxed()
                    .shared();
                    starting.insert(unit_id.to_string(), shared.clone());
                    shared
                }
            }
        };

        attempt
            .await
            .map_err(|e| Arc::try_unwrap(e).unwrap_or_else(|shared| shared.duplicate()))
    }

    async fn start_attempt(self: &Arc<Self>, unit_id: &str) -> Result<StartOutcome> {
        let unit = self.get_unit(unit_id)?;

        let script = self.config.current_path(unit_id);
        if !script.exists() {
            return Err(Error::Validation(format!(
                "unit {} has no content to run",
                unit_id
            )));
        }

        unit.set_status(UnitStatus::Starting);
        unit.set_last_error(None);
        unit.set_intended_state(IntendedState::Running);
        self.persist_registry()?;
        self.publish_unit_update(&unit);

        let mut command = Command::new(&self.config.interpreter);
        command
            .arg(&script)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                let reason = format!("failed to spawn {}: {}", self.config.interpreter, e);
                warn!(unit = %unit_id, error = %reason, "spawn failed");
                unit.set_status(UnitStatus::Error);
                unit.set_last_error(Some(reason.clone()));
                self.publish_unit_update(&unit);
                return Err(Error::ProcessFailure(reason));
            }
        };

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let epoch = unit.bump_spawn_epoch();
        *unit.child.lock().await = Some(child);
        unit.mark_started();
        unit.set_status(UnitStatus::Running);
        self.append_system_log(&unit, "Process started".to_string());
        self.publish_unit_update(&unit);
        info!(unit = %unit_id, "process started");

        if let Some(stdout) = stdout {
            let sup = Arc::clone(self);
            let u = Arc::clone(&unit);
            tokio::spawn(async move { sup.pump_output(u, stdout, LogLevel::Info).await });
        }
        if let Some(stderr) = stderr {
            let sup = Arc::clone(self);
            let u = Arc::clone(&unit);
            tokio::spawn(async move { sup.pump_output(u, stderr, LogLevel::Error).await });
        }

        let sup = Arc::clone(self);
        let u = Arc::clone(&unit);
        tokio::spawn(async move { sup.monitor(u, epoch).await });

        Ok(StartOutcome {
            already_running: false,
        })
    }

    /// Graceful-then-forced stop. Sets durable intended state first.
    pub async fn stop(self: &Arc<Self>, unit_id: &str) -> Result<()> {
        let unit = self.get_unit(unit_id)?;
        unit.set_intended_state(IntendedState::Stopped);
        self.persist_registry()?;

        // Terminate when a live handle exists, then normalize the bookkeeping
        // either way: a crashed unit awaiting auto-restart is stopped too, and
        // its restart budget starts fresh next time.
        let child = unit.child.lock().await.take();
        if let Some(mut child) = child {
            unit.set_status(UnitStatus::Stopping);
            self.publish_unit_update(&unit);

            #[cfg(unix)]
            if let Some(pid) = child.id() {
                use nix::sys::signal::{kill, Signal};
                use nix::unistd::Pid;
                let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
            }
            #[cfg(not(unix))]
            let _ = child.start_kill();

            match timeout(self.config.stop_grace, child.wait()).await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => warn!(unit = %unit_id, error = %e, "wait after terminate failed"),
                Err(_) => {
                    warn!(unit = %unit_id, "grace period elapsed, killing");
                    let _ = child.kill().await;
                    let _ = child.wait().await;
                }
            }

            self.append_system_log(&unit, "Process stopped".to_string());
            info!(unit = %unit_id, "process stopped");
        }

        unit.set_connected(false);
        unit.set_status(UnitStatus::Stopped);
        unit.reset_restart_attempts();
        self.publish_unit_update(&unit);
        Ok(())
    }

    /// Roll a unit's content back to a stored version. A running unit is
    /// restarted on the restored content.
    pub async fn rollback(self: &Arc<Self>, unit_id: &str, version: u64) -> Result<RollbackOutcome> {
        let unit = self.get_unit(unit_id)?;
        let was_running = unit.has_live_handle().await;

        let outcome = unit.versions.lock().rollback(version)?;
        info!(unit = %unit_id, version, "content rolled back");

        let _ = self.bus.publish(
            &Channel::Global,
            ServerEvent::UnitRolledBack(RolledBackData {
                unit_id: unit_id.to_string(),
                version: outcome.restored_version,
                saved_current_as: outcome.saved_current_as,
            }),
        );
        self.publish_stats(&unit);

        if was_running {
            self.stop(unit_id).await?;
            self.start(unit_id).await?;
        }
        Ok(outcome)
    }

    /// Handshake from the unit's script: it is up and serving
    pub fn mark_connected(self: &Arc<Self>, unit_id: &str) -> Result<()> {
        let unit = self.get_unit(unit_id)?;
        unit.set_connected(true);
        self.publish_unit_update(&unit);
        Ok(())
    }

    /// Relay egress-cache statistics from the network module, verbatim
    pub fn relay_egress_stats(self: &Arc<Self>, unit_id: &str, stats: Value) -> Result<()> {
        let unit = self.get_unit(unit_id)?;
        unit.set_egress_stats(stats);
        self.publish_stats(&unit);
        Ok(())
    }

    // ---- logs ----------------------------------------------------------------

    pub fn read_logs(&self, unit_id: &str, page: usize, limit: usize) -> Result<(Vec<LogEntry>, PageMeta)> {
        let unit = self.get_unit(unit_id)?;
        let result = unit.logs.lock().read(page, limit);
        result
    }

    pub fn export_logs(&self, unit_id: &str) -> Result<String> {
        let unit = self.get_unit(unit_id)?;
        let result = unit.logs.lock().export();
        result
    }

    pub fn clear_logs(self: &Arc<Self>, unit_id: &str) -> Result<()> {
        let unit = self.get_unit(unit_id)?;
        let marker = unit.logs.lock().clear()?;
        info!(unit = %unit_id, "logs cleared");

        let _ = self.bus.publish(
            &Channel::Logs(unit_id.to_string()),
            ServerEvent::LogsCleared(LogsClearedData {
                unit_id: unit_id.to_string(),
                marker_sequence: marker.sequence,
            }),
        );
        self.publish_stats(&unit);
        Ok(())
    }

    // ---- reconciliation --------------------------------------------------------

    /// Bring every unit whose durable intended state is `running` up, in
    /// fixed-size batches, verifying the connection handshake per unit before
    /// advancing so cold-start load on downstream dependencies stays bounded.
    pub async fn reconcile_intended_state(self: &Arc<Self>) -> ReconcileReport {
        let candidates: Vec<Arc<Unit>> = {
            self.units
                .read()
                .values()
                .filter(|u| u.intended_state() == IntendedState::Running)
                .cloned()
                .collect()
        };

        let mut report = ReconcileReport {
            should_be_running: candidates.len(),
            ..Default::default()
        };
        info!(
            should_be_running = candidates.len(),
            "reconciling intended state"
        );

        for batch in candidates.chunks(self.config.reconcile_batch_size.max(1)) {
            let outcomes = futures::future::join_all(
                batch.iter().map(|unit| self.reconcile_one(Arc::clone(unit))),
            )
            .await;

            for outcome in outcomes {
                match outcome {
                    ReconcileOutcome::AlreadyRunning => report.already_running += 1,
                    ReconcileOutcome::Started { connected } => {
                        report.attempted += 1;
                        report.succeeded += 1;
                        if connected {
                            report.connected += 1;
                        } else {
                            report.connection_timeouts += 1;
                        }
                    }
                    ReconcileOutcome::Failed { id, error } => {
                        report.attempted += 1;
                        report.failed.push(ReconcileFailure { id, error });
                    }
                }
            }
        }

        info!(
            succeeded = report.succeeded,
            already_running = report.already_running,
            failed = report.failed.len(),
            timeouts = report.connection_timeouts,
            "reconciliation finished"
        );
        report
    }

    async fn reconcile_one(self: &Arc<Self>, unit: Arc<Unit>) -> ReconcileOutcome {
        let id = unit.id();
        let has_handle = unit.has_live_handle().await;

        if unit.status() == UnitStatus::Running {
            if has_handle {
                return ReconcileOutcome::AlreadyRunning;
            }
            // Stale bookkeeping: the status claims running but no handle exists
            unit.set_status(UnitStatus::Stopped);
        }

        match self.start(&id).await {
            Ok(outcome) if outcome.already_running => ReconcileOutcome::AlreadyRunning,
            Ok(_) => {
                let connected = self
                    .wait_for_connection(&unit, self.config.connection_timeout)
                    .await;
                ReconcileOutcome::Started { connected }
            }
            Err(e) => ReconcileOutcome::Failed {
                id,
                error: e.to_string(),
            },
        }
    }

    /// Poll until the unit reports connected or the timeout elapses.
    /// A timeout is not an error; the unit still counts as started.
    pub async fn wait_for_connection(&self, unit: &Arc<Unit>, limit: Duration) -> bool {
        if unit.connected() {
            return true;
        }
        let deadline = Instant::now() + limit;
        while Instant::now() < deadline {
            sleep(Duration::from_millis(100)).await;
            if unit.connected() {
                return true;
            }
        }
        false
    }

    // ---- queries -----------------------------------------------------------------

    pub fn get_unit(&self, unit_id: &str) -> Result<Arc<Unit>> {
        self.units
            .read()
            .get(unit_id)
            .cloned()
            .ok_or_else(|| Error::unit_not_found(unit_id))
    }

    /// All units, stable order (oldest first, id as tiebreak)
    pub fn list_units(&self) -> Vec<UnitView> {
        let mut views: Vec<UnitView> = self.units.read().values().map(|u| u.view()).collect();
        views.sort_by(|a, b| a.id.cmp(&b.id));
        views
    }

    pub fn unit_stats(&self, unit_id: &str) -> Result<UnitStats> {
        let unit = self.get_unit(unit_id)?;
        Ok(self.stats_for(&unit))
    }

    pub fn list_versions(&self, unit_id: &str, page: usize, limit: usize) -> Result<(Vec<VersionMeta>, PageMeta)> {
        let unit = self.get_unit(unit_id)?;
        let result = unit.versions.lock().list(page, limit);
        Ok(result)
    }

    pub fn unit_content(&self, unit_id: &str) -> Result<String> {
        let unit = self.get_unit(unit_id)?;
        let result = unit.versions.lock().current_content();
        result
    }

    /// Current telemetry published on the `metrics` channel
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        let units = self.units.read();
        let units_running = units
            .values()
            .filter(|u| u.status() == UnitStatus::Running)
            .count();
        let units_error = units
            .values()
            .filter(|u| u.status() == UnitStatus::Error)
            .count();
        let total_log_entries = units.values().map(|u| u.logs.lock().total_count()).sum();

        MetricsSnapshot {
            timestamp: crate::utils::current_timestamp(),
            uptime_secs: self.started_at.elapsed().as_secs(),
            units_total: units.len(),
            units_running,
            units_error,
            total_log_entries,
            interval_secs: self.config.metrics_interval.as_secs(),
        }
    }

    /// Full current state of a channel, pushed to late subscribers so they
    /// are never blind until the next delta
    pub fn channel_snapshot(&self, channel: &Channel) -> ServerEvent {
        let mut snapshot = InitSnapshot {
            channel: channel.to_string(),
            ..Default::default()
        };
        match channel {
            Channel::Global => snapshot.units = Some(self.list_units()),
            Channel::Stats(id) => snapshot.stats = self.unit_stats(id).ok(),
            Channel::Logs(id) => {
                snapshot.logs = self
                    .get_unit(id)
                    .map(|u| {
                        let logs = u.logs.lock();
                        logs.recent(self.config.log_memory_capacity)
                    })
                    .ok();
            }
            Channel::Metrics => snapshot.metrics = Some(self.metrics_snapshot()),
        }
        ServerEvent::Init(snapshot)
    }

    // ---- internals ------------------------------------------------------------------

    async fn pump_output<R>(self: Arc<Self>, unit: Arc<Unit>, reader: R, level: LogLevel)
    where
        R: AsyncRead + Unpin,
    {
        let unit_id = unit.id();
        let mut lines = BufReader::new(reader).lines();

        while let Ok(Some(line)) = lines.next_line().await {
            // First stdout line doubles as a readiness signal for scripts
            // that never call the handshake endpoint.
            if level == LogLevel::Info && !unit.connected() {
                unit.set_connected(true);
                self.publish_unit_update(&unit);
            }

            let entry = { unit.logs.lock().append(line, level) };
            match entry {
                Ok(entry) => {
                    let _ = self.bus.publish(
                        &Channel::Logs(unit_id.clone()),
                        ServerEvent::Log(LogEventData {
                            unit_id: unit_id.clone(),
                            entry,
                        }),
                    );
                    self.publish_stats(&unit);
                }
                Err(e) => warn!(unit = %unit_id, error = %e, "log append failed"),
            }
        }
    }

    /// Watch one spawn until it exits. Bails out when the unit was stopped
    /// externally (handle taken) or a newer spawn superseded this epoch.
    async fn monitor(self: Arc<Self>, unit: Arc<Unit>, epoch: u64) {
        loop {
            sleep(Duration::from_millis(200)).await;
            if unit.spawn_epoch() != epoch {
                return;
            }

            let exit = {
                let mut guard = unit.child.lock().await;
                match guard.as_mut() {
                    None => return,
                    Some(child) => match child.try_wait() {
                        Ok(None) => None,
                        Ok(Some(status)) => {
                            *guard = None;
                            Some(status.code())
                        }
                        Err(e) => {
                            warn!(unit = %unit.id(), error = %e, "try_wait failed");
                            *guard = None;
                            Some(None)
                        }
                    },
                }
            };

            if let Some(code) = exit {
                self.handle_exit(unit, code).await;
                return;
            }
        }
    }

    async fn handle_exit(self: &Arc<Self>, unit: Arc<Unit>, code: Option<i32>) {
        let unit_id = unit.id();
        unit.set_connected(false);

        let clean = code == Some(0);
        if clean {
            unit.set_status(UnitStatus::Stopped);
            self.append_system_log(&unit, "Process exited cleanly".to_string());
            info!(unit = %unit_id, "process exited cleanly");
        } else {
            let reason = match code {
                Some(code) => format!("Process exited with code {}", code),
                None => "Process terminated by signal".to_string(),
            };
            unit.set_status(UnitStatus::Error);
            unit.set_last_error(Some(reason.clone()));
            self.append_system_log(&unit, reason.clone());
            warn!(unit = %unit_id, reason = %reason, "process crashed");
        }
        self.publish_unit_update(&unit);

        // Crash recovery, gated on the durable intent still being `running`
        if clean || !unit.auto_restart() || unit.intended_state() != IntendedState::Running {
            return;
        }

        let attempt = unit.bump_restart_attempts();
        if !self.backoff.allows(attempt) {
            self.append_system_log(
                &unit,
                format!("Restart attempts exhausted after {} tries", attempt),
            );
            self.publish_unit_update(&unit);
            return;
        }

        let delay = self.backoff.delay(attempt);
        self.append_system_log(
            &unit,
            format!("Restarting in {}s (attempt {})", delay.as_secs(), attempt + 1),
        );

        let sup = Arc::clone(self);
        tokio::spawn(async move {
            sleep(delay).await;
            if unit.intended_state() != IntendedState::Running || unit.has_live_handle().await {
                return;
            }
            if let Err(e) = sup.start(&unit_id).await {
                warn!(unit = %unit_id, error = %e, "auto-restart failed");
            }
        });
    }

    fn append_system_log(&self, unit: &Arc<Unit>, message: String) {
        let entry = { unit.logs.lock().append(message, LogLevel::System) };
        match entry {
            Ok(entry) => {
                let _ = self.bus.publish(
                    &Channel::Logs(unit.id()),
                    ServerEvent::Log(LogEventData {
                        unit_id: unit.id(),
                        entry,
                    }),
                );
            }
            Err(e) => warn!(unit = %unit.id(), error = %e, "system log append failed"),
        }
    }

    fn publish_unit_update(&self, unit: &Arc<Unit>) {
        let _ = self
            .bus
            .publish(&Channel::Global, ServerEvent::UnitUpdate(unit.view()));
    }

    fn publish_stats(&self, unit: &Arc<Unit>) {
        let stats = self.stats_for(unit);
        let _ = self.bus.publish(
            &Channel::Stats(unit.id()),
            ServerEvent::StatsUpdate(stats),
        );
    }

    fn stats_for(&self, unit: &Arc<Unit>) -> UnitStats {
        let (log_count, log_file_size) = {
            let logs = unit.logs.lock();
            (logs.total_count(), logs.file_size())
        };
        UnitStats {
            unit_id: unit.id(),
            log_count,
            log_file_size,
            version_count: unit.versions.lock().count(),
            egress: unit.egress_stats(),
        }
    }

    fn persist_registry(&self) -> Result<()> {
        let mut records: Vec<UnitRecord> =
            self.units.read().values().map(|u| u.record()).collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        self.registry.save(records)
    }

    fn generate_unit_id() -> String {
        use std::time::{SystemTime, UNIX_EPOCH};
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        format!("unit_{:x}", nanos)
    }
}

enum ReconcileOutcome {
    AlreadyRunning,
    Started { connected: bool },
    Failed { id: String, error: String },
}
