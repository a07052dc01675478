//! API module for HTTP and WebSocket endpoints
//!
//! Inbound commands arrive over REST already authorized; real-time state
//! deltas, logs and metrics are pushed over the WebSocket layer.

pub mod http;
pub mod rest;
pub mod ws;
