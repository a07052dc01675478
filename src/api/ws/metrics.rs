//! Periodic telemetry publisher
//!
//! Publishes a [`MetricsSnapshot`](super::events::MetricsSnapshot) on the
//! `metrics` channel at a fixed cadence. The snapshot carries its own nominal
//! interval so clients can detect a stalled stream.

use std::sync::Arc;

use tokio::task::JoinHandle;

use super::bus::Channel;
use super::events::ServerEvent;
use crate::supervisor::Supervisor;

/// Spawn the metrics publisher task
pub fn spawn_metrics_publisher(supervisor: Arc<Supervisor>) -> JoinHandle<()> {
    let period = supervisor.config().metrics_interval;
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(period);
        loop {
            tick.tick().await;
            let snapshot = supervisor.metrics_snapshot();
            let _ = supervisor
                .bus()
                .publish(&Channel::Metrics, ServerEvent::Metrics(snapshot));
        }
    })
}
