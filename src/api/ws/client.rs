//! Client companion policy
//!
//! Server-side counterpart definitions for the reconnect and dedup behavior
//! viewers are expected to implement: an explicit reconnect state machine
//! driven by a scheduled delay (not retry-on-error callbacks), stall
//! detection against a channel's nominal cadence, and a bounded per-unit
//! recent-sequence window that discards duplicate log events arising from
//! reconnect races.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

/// Missing ~3.5× the expected interval forces a reconnect rather than
/// waiting for the transport to notice.
const STALL_FACTOR: f64 = 3.5;

/// Connection phase of the reconnect state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    Connecting,
    Open,
    Backoff,
}

/// Reconnect state machine: exponential backoff with a capped ceiling,
/// reset on every successful open
#[derive(Debug, Clone)]
pub struct ReconnectState {
    base: Duration,
    max: Duration,
    phase: ConnectionPhase,
    attempt: u32,
}

impl ReconnectState {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            phase: ConnectionPhase::Connecting,
            attempt: 0,
        }
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// A connect attempt is being made
    pub fn on_connecting(&mut self) {
        self.phase = ConnectionPhase::Connecting;
    }

    /// The stream opened; backoff resets
    pub fn on_open(&mut self) {
        self.phase = ConnectionPhase::Open;
        self.attempt = 0;
    }

    /// The stream closed or stalled; returns the delay before the next
    /// connect attempt (base delay doubling up to the cap)
    pub fn on_close(&mut self) -> Duration {
        self.phase = ConnectionPhase::Backoff;
        let exp = self.attempt.min(31);
        self.attempt += 1;
        let delay = self
            .base
            .saturating_mul(2u32.saturating_pow(exp))
            .min(self.max);
        delay.max(self.base)
    }
}

impl Default for ReconnectState {
    fn default() -> Self {
        Self::new(Duration::from_millis(500), Duration::from_secs(30))
    }
}

/// Whether a channel with a known nominal cadence has gone quiet long
/// enough to force a reconnect
pub fn is_stalled(expected_interval: Duration, since_last_event: Duration) -> bool {
    since_last_event.as_secs_f64() > expected_interval.as_secs_f64() * STALL_FACTOR
}

/// Bounded per-unit recent-sequence window for discarding duplicates
pub struct DedupWindow {
    capacity: usize,
    seen: HashMap<String, VecDeque<u64>>,
}

impl DedupWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            seen: HashMap::new(),
        }
    }

    /// Record a sequence number. Returns true when it is fresh, false when
    /// it was already seen within the window (a duplicate to discard).
    pub fn observe(&mut self, unit_id: &str, sequence: u64) -> bool {
        let window = self.seen.entry(unit_id.to_string()).or_default();
        if window.contains(&sequence) {
            return false;
        }
        window.push_back(sequence);
        while window.len() > self.capacity {
            window.pop_front();
        }
        true
    }

    /// Forget a unit entirely (e.g. after it was deleted)
    pub fn forget(&mut self, unit_id: &str) {
        self.seen.remove(unit_id);
    }
}

impl Default for DedupWindow {
    fn default() -> Self {
        Self::new(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_resets_on_open() {
        let mut state = ReconnectState::new(Duration::from_millis(100), Duration::from_secs(5));

        assert_eq!(state.on_close(), Duration::from_millis(100));
        assert_eq!(state.on_close(), Duration::from_millis(200));
        assert_eq!(state.on_close(), Duration::from_millis(400));
        assert_eq!(state.phase(), ConnectionPhase::Backoff);

        state.on_open();
        assert_eq!(state.phase(), ConnectionPhase::Open);
        assert_eq!(state.on_close(), Duration::from_millis(100));
    }

    #[test]
    fn test_backoff_is_capped() {
        let mut state = ReconnectState::new(Duration::from_millis(100), Duration::from_secs(5));
        for _ in 0..20 {
            state.on_close();
        }
        assert_eq!(state.on_close(), Duration::from_secs(5));
    }

    #[test]
    fn test_stall_detection() {
        let interval = Duration::from_secs(5);
        assert!(!is_stalled(interval, Duration::from_secs(17)));
        assert!(is_stalled(interval, Duration::from_secs(18)));
    }

    #[test]
    fn test_duplicate_sequence_is_discarded() {
        let mut window = DedupWindow::new(100);
        assert!(window.observe("u1", 1));
        assert!(window.observe("u1", 2));
        // Same sequence delivered twice: second delivery discarded
        assert!(!window.observe("u1", 2));
        // Other units have independent windows
        assert!(window.observe("u2", 2));
    }

    #[test]
    fn test_window_is_bounded() {
        let mut window = DedupWindow::new(3);
        for seq in 1..=5 {
            assert!(window.observe("u1", seq));
        }
        // 1 and 2 fell out of the window, so they pass as fresh again
        assert!(window.observe("u1", 1));
        // 5 is still inside
        assert!(!window.observe("u1", 5));
    }
}
