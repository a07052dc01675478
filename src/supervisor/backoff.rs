//! Crash restart backoff
//!
//! Controls how auto-restart delays grow after repeated crashes. The delay
//! for attempt `n` is `first × factor^n`, clamped to `max`. The base delay is
//! derived purely from the attempt number, so previous delays never feed back
//! into the calculation.

use std::time::Duration;

/// Restart backoff policy
#[derive(Clone, Copy, Debug)]
pub struct RestartBackoff {
    /// Initial delay before the first restart
    pub first: Duration,
    /// Maximum delay cap
    pub max: Duration,
    /// Multiplicative growth factor (`>= 1.0` recommended)
    pub factor: f64,
    /// Consecutive attempts before giving up
    pub max_attempts: u32,
}

impl Default for RestartBackoff {
    fn default() -> Self {
        Self {
            first: Duration::from_secs(1),
            max: Duration::from_secs(60),
            factor: 2.0,
            max_attempts: 5,
        }
    }
}

impl RestartBackoff {
    /// Delay for the given attempt number (0-indexed), clamped to `max`
    pub fn delay(&self, attempt: u32) -> Duration {
        let max_secs = self.max.as_secs_f64();
        let exp = attempt.min(i32::MAX as u32) as i32;
        let secs = self.first.as_secs_f64() * self.factor.powi(exp);

        if !secs.is_finite() || secs < 0.0 || secs > max_secs {
            self.max
        } else {
            Duration::from_secs_f64(secs)
        }
    }

    /// Whether another restart should be attempted
    pub fn allows(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_doubles_and_caps() {
        let backoff = RestartBackoff {
            first: Duration::from_millis(100),
            max: Duration::from_secs(10),
            factor: 2.0,
            max_attempts: 5,
        };

        assert_eq!(backoff.delay(0), Duration::from_millis(100));
        assert_eq!(backoff.delay(1), Duration::from_millis(200));
        assert_eq!(backoff.delay(3), Duration::from_millis(800));
        // 100ms × 2^10 = 102.4s, capped
        assert_eq!(backoff.delay(10), Duration::from_secs(10));
    }

    #[test]
    fn test_attempt_limit() {
        let backoff = RestartBackoff {
            max_attempts: 3,
            ..Default::default()
        };
        assert!(backoff.allows(0));
        assert!(backoff.allows(2));
        assert!(!backoff.allows(3));
    }

    #[test]
    fn test_huge_attempt_does_not_overflow() {
        let backoff = RestartBackoff::default();
        assert_eq!(backoff.delay(u32::MAX), backoff.max);
    }
}
