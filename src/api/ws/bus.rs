//! Event bus: channel-keyed subscriber registry
//!
//! Unlike a single broadcast list, the bus keeps an explicit set of sessions
//! per channel so delivery is selective and channels can be dropped
//! independently. Delivery is best-effort and at-most-once per connection:
//! there is no replay buffer, a reconnecting client resynchronizes from the
//! `init` snapshot it receives on subscribe.
//!
//! Ordering: events published to one channel reach each subscriber in
//! publish order (per-session FIFO queues); nothing is promised across
//! channels.

use std::collections::{HashMap, HashSet};
use std::fmt;

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::debug;

use super::events::ServerEvent;
use crate::error::{Error, Result};

/// Session identifier, unique per Gateway connection
pub type SessionId = String;

/// A named topic carrying a scoped subset of real-time events
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Roster and status changes; implicitly received by every connection
    Global,
    /// Lightweight metadata for one unit
    Stats(String),
    /// Full log-line stream for one unit; explicit subscribe to bound bandwidth
    Logs(String),
    /// System telemetry
    Metrics,
}

impl Channel {
    /// Parse a channel key (`global`, `stats:<unitId>`, `logs:<unitId>`, `metrics`)
    pub fn parse(key: &str) -> Result<Self> {
        match key {
            "global" => Ok(Channel::Global),
            "metrics" => Ok(Channel::Metrics),
            _ => {
                if let Some(id) = key.strip_prefix("stats:") {
                    if !id.is_empty() {
                        return Ok(Channel::Stats(id.to_string()));
                    }
                } else if let Some(id) = key.strip_prefix("logs:") {
                    if !id.is_empty() {
                        return Ok(Channel::Logs(id.to_string()));
                    }
                }
                Err(Error::Validation(format!("unknown channel key: {}", key)))
            }
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Global => write!(f, "global"),
            Channel::Stats(id) => write!(f, "stats:{}", id),
            Channel::Logs(id) => write!(f, "logs:{}", id),
            Channel::Metrics => write!(f, "metrics"),
        }
    }
}

struct BusInner {
    sessions: HashMap<SessionId, mpsc::UnboundedSender<ServerEvent>>,
    channels: HashMap<Channel, HashSet<SessionId>>,
}

/// Channel-keyed publish/subscribe registry
pub struct EventBus {
    inner: RwLock<BusInner>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(BusInner {
                sessions: HashMap::new(),
                channels: HashMap::new(),
            }),
        }
    }

    /// Register a session, implicitly subscribed to `global`.
    /// Returns the receiving end of the session's event queue.
    pub fn register(&self, session_id: &str) -> mpsc::UnboundedReceiver<ServerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.write();
        inner.sessions.insert(session_id.to_string(), tx);
        inner
            .channels
            .entry(Channel::Global)
            .or_default()
            .insert(session_id.to_string());
        rx
    }

    /// Drop a session and every subscription bound to it
    pub fn unregister(&self, session_id: &str) {
        let mut inner = self.inner.write();
        inner.sessions.remove(session_id);
        for subs in inner.channels.values_mut() {
            subs.remove(session_id);
        }
        inner.channels.retain(|_, subs| !subs.is_empty());
    }

    /// Idempotent subscribe. Returns false for sessions the bus doesn't know.
    pub fn subscribe(&self, session_id: &str, channel: Channel) -> bool {
        let mut inner = self.inner.write();
        if !inner.sessions.contains_key(session_id) {
            return false;
        }
        inner
            .channels
            .entry(channel)
            .or_default()
            .insert(session_id.to_string());
        true
    }

    /// Idempotent unsubscribe
    pub fn unsubscribe(&self, session_id: &str, channel: &Channel) {
        let mut inner = self.inner.write();
        if let Some(subs) = inner.channels.get_mut(channel) {
            subs.remove(session_id);
            if subs.is_empty() {
                inner.channels.remove(channel);
            }
        }
    }

    /// Fan an event out to every current subscriber of the channel.
    ///
    /// A closed session never aborts delivery to the rest; dead sessions are
    /// pruned after the pass. Returns the number of sessions reached.
    pub fn publish(&self, channel: &Channel, event: ServerEvent) -> usize {
        let mut dead = Vec::new();
        let mut delivered = 0;

        {
            let inner = self.inner.read();
            let Some(subs) = inner.channels.get(channel) else {
                return 0;
            };
            for session_id in subs {
                match inner.sessions.get(session_id) {
                    Some(tx) if tx.send(event.clone()).is_ok() => delivered += 1,
                    _ => dead.push(session_id.clone()),
                }
            }
        }

        for session_id in dead {
            debug!(session = %session_id, "pruning closed session during fan-out");
            self.unregister(&session_id);
        }

        delivered
    }

    /// Send one event to a single session (snapshot pushes)
    pub fn send_to(&self, session_id: &str, event: ServerEvent) -> bool {
        let inner = self.inner.read();
        inner
            .sessions
            .get(session_id)
            .map(|tx| tx.send(event).is_ok())
            .unwrap_or(false)
    }

    /// Whether the session currently subscribes to the channel
    pub fn is_subscribed(&self, session_id: &str, channel: &Channel) -> bool {
        self.inner
            .read()
            .channels
            .get(channel)
            .map(|subs| subs.contains(session_id))
            .unwrap_or(false)
    }

    /// Number of registered sessions
    pub fn session_count(&self) -> usize {
        self.inner.read().sessions.len()
    }

    /// Generate a new session id
    pub fn generate_session_id() -> SessionId {
        use std::time::{SystemTime, UNIX_EPOCH};
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        format!("sess_{:x}", nanos)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_parse_round_trip() {
        for key in ["global", "metrics", "stats:u1", "logs:u1"] {
            let channel = Channel::parse(key).unwrap();
            assert_eq!(channel.to_string(), key);
        }
        assert!(Channel::parse("logs:").is_err());
        assert!(Channel::parse("bogus").is_err());
    }

    #[tokio::test]
    async fn test_register_implies_global() {
        let bus = EventBus::new();
        let mut rx = bus.register("s1");

        let n = bus.publish(&Channel::Global, ServerEvent::Ping);
        assert_eq!(n, 1);
        assert!(matches!(rx.recv().await, Some(ServerEvent::Ping)));
    }

    #[tokio::test]
    async fn test_selective_delivery() {
        let bus = EventBus::new();
        let mut rx1 = bus.register("s1");
        let mut rx2 = bus.register("s2");

        bus.subscribe("s1", Channel::Logs("u1".to_string()));
        let n = bus.publish(&Channel::Logs("u1".to_string()), ServerEvent::Ping);
        assert_eq!(n, 1);

        assert!(matches!(rx1.recv().await, Some(ServerEvent::Ping)));
        // s2 never subscribed to logs:u1
        assert!(rx2.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_publish_order_is_preserved_per_session() {
        let bus = EventBus::new();
        let mut rx = bus.register("s1");
        bus.subscribe("s1", Channel::Logs("u1".to_string()));

        let channel = Channel::Logs("u1".to_string());
        for seq in 1..=5u64 {
            bus.publish(
                &channel,
                ServerEvent::LogsCleared(super::super::events::LogsClearedData {
                    unit_id: "u1".to_string(),
                    marker_sequence: seq,
                }),
            );
        }

        for expected in 1..=5u64 {
            match rx.recv().await {
                Some(ServerEvent::LogsCleared(data)) => {
                    assert_eq!(data.marker_sequence, expected)
                }
                other => panic!("unexpected event: {:?}", other),
            }
        }
    }

    #[test]
    fn test_subscribe_is_idempotent() {
        let bus = EventBus::new();
        let _rx = bus.register("s1");

        assert!(bus.subscribe("s1", Channel::Metrics));
        assert!(bus.subscribe("s1", Channel::Metrics));
        assert_eq!(bus.publish(&Channel::Metrics, ServerEvent::Ping), 1);

        bus.unsubscribe("s1", &Channel::Metrics);
        bus.unsubscribe("s1", &Channel::Metrics);
        assert_eq!(bus.publish(&Channel::Metrics, ServerEvent::Ping), 0);
    }

    #[test]
    fn test_dead_session_is_isolated() {
        let bus = EventBus::new();
        let rx1 = bus.register("s1");
        let _rx2 = bus.register("s2");
        bus.subscribe("s1", Channel::Metrics);
        bus.subscribe("s2", Channel::Metrics);

        drop(rx1); // s1's receiver is gone

        let delivered = bus.publish(&Channel::Metrics, ServerEvent::Ping);
        assert_eq!(delivered, 1);
        assert_eq!(bus.session_count(), 1);
    }

    #[test]
    fn test_unregister_drops_all_subscriptions() {
        let bus = EventBus::new();
        let _rx = bus.register("s1");
        bus.subscribe("s1", Channel::Metrics);
        bus.subscribe("s1", Channel::Stats("u1".to_string()));

        bus.unregister("s1");
        assert_eq!(bus.publish(&Channel::Metrics, ServerEvent::Ping), 0);
        assert_eq!(bus.session_count(), 0);
        assert!(!bus.is_subscribed("s1", &Channel::Global));
    }
}
