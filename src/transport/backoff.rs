//! Reconnection backoff policy.
//!
//! Delay before retry `n` (zero-based) is `min(base * 2^n, cap)`. The
//! counter resets only after a successful open.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Delay before the first reconnection attempt.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Upper bound on any single reconnection delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(10_000);

/// Automatic attempts before the transport gives up and stays closed.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

// ============================================================================
// ReconnectPolicy
// ============================================================================

/// Bounded exponential backoff for automatic reconnection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Delay for attempt 0.
    pub base_delay: Duration,
    /// Cap applied after doubling.
    pub max_delay: Duration,
    /// Number of automatic attempts; `0` disables reconnection.
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl ReconnectPolicy {
    /// Policy that never reconnects automatically.
    #[inline]
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            max_attempts: 0,
            ..Self::default()
        }
    }

    /// Sets the base delay.
    #[inline]
    #[must_use]
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Sets the delay cap.
    #[inline]
    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the attempt budget.
    #[inline]
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Returns the delay before attempt `attempt` (zero-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(Duration::MAX)
            .min(self.max_delay)
    }

    /// Returns the delay for the next attempt, or `None` once
    /// `attempts_made` has used up the budget.
    #[inline]
    #[must_use]
    pub fn next_delay(&self, attempts_made: u32) -> Option<Duration> {
        (attempts_made < self.max_attempts).then(|| self.delay_for(attempts_made))
    }

    /// Checks that the delays are usable.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if the base delay is zero or exceeds the cap.
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Ok(());
        }
        if self.base_delay.is_zero() {
            return Err(Error::config("reconnect base delay must be non-zero"));
        }
        if self.base_delay > self.max_delay {
            return Err(Error::config(format!(
                "reconnect base delay {:?} exceeds cap {:?}",
                self.base_delay, self.max_delay
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn test_default_schedule() {
        let policy = ReconnectPolicy::default();
        let delays: Vec<u64> = (0..5)
            .map(|n| policy.delay_for(n).as_millis() as u64)
            .collect();
        assert_eq!(delays, vec![1000, 2000, 4000, 8000, 10_000]);
    }

    #[test]
    fn test_budget_is_bounded() {
        let policy = ReconnectPolicy::default();
        assert!(policy.next_delay(4).is_some());
        assert_eq!(policy.next_delay(5), None);
        assert_eq!(ReconnectPolicy::disabled().next_delay(0), None);
    }

    #[test]
    fn test_large_attempt_saturates_at_cap() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.delay_for(40), DEFAULT_MAX_DELAY);
        assert_eq!(policy.delay_for(u32::MAX), DEFAULT_MAX_DELAY);
    }

    #[test]
    fn test_validate() {
        assert!(ReconnectPolicy::default().validate().is_ok());
        assert!(ReconnectPolicy::disabled()
            .with_base_delay(Duration::ZERO)
            .validate()
            .is_ok());
        assert!(ReconnectPolicy::default()
            .with_base_delay(Duration::ZERO)
            .validate()
            .is_err());
        assert!(ReconnectPolicy::default()
            .with_base_delay(Duration::from_secs(20))
            .validate()
            .is_err());
    }

    proptest! {
        #[test]
        fn prop_delay_matches_capped_doubling(attempt in 0u32..5) {
            let policy = ReconnectPolicy::default();
            let expected = (1000u64 << attempt).min(10_000);
            prop_assert_eq!(policy.delay_for(attempt).as_millis() as u64, expected);
        }

        #[test]
        fn prop_delay_is_monotonic_and_capped(
            base_ms in 1u64..5_000,
            extra_ms in 0u64..60_000,
            attempt in 0u32..64,
        ) {
            let policy = ReconnectPolicy::default()
                .with_base_delay(Duration::from_millis(base_ms))
                .with_max_delay(Duration::from_millis(base_ms + extra_ms));
            let current = policy.delay_for(attempt);
            prop_assert!(current <= policy.max_delay);
            prop_assert!(current >= policy.base_delay);
            prop_assert!(policy.delay_for(attempt + 1) >= current);
        }
    }
}
