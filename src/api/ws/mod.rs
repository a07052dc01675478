//! WebSocket push layer
//!
//! Provides the `/ws` endpoint: an event bus with channel-keyed
//! subscriptions (`global`, `stats:<unitId>`, `logs:<unitId>`, `metrics`),
//! a gateway task per connection, snapshot-on-subscribe, and the companion
//! reconnect/dedup policy clients are expected to follow.

pub mod bus;
pub mod client;
pub mod events;
pub mod handler;
pub mod metrics;
pub mod state;

pub use bus::{Channel, EventBus, SessionId};
pub use client::{ConnectionPhase, DedupWindow, ReconnectState};
pub use metrics::spawn_metrics_publisher;
pub use state::AppState;
