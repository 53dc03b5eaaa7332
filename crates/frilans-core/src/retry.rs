// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Exponential backoff with jitter, shared by fetch retries and send retries.

use std::time::Duration;

/// Backoff schedule: `base * 2^attempt`, capped at `max`, with +/-25% jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Number of attempts after the first one.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Upper bound on any single delay before jitter is applied.
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
        }
    }

    /// Total attempts this policy allows, including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay to wait after the given zero-based failed attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base_ms = self.base_delay.as_millis() as u64;
        let max_ms = self.max_delay.as_millis() as u64;

        let delay_ms = base_ms.saturating_mul(2u64.saturating_pow(attempt));
        let delay_ms = delay_ms.min(max_ms);

        let jitter_range = delay_ms / 4;
        let delay_ms = if jitter_range > 0 {
            let offset = rand::random::<u64>() % (jitter_range * 2);
            delay_ms - jitter_range + offset
        } else {
            delay_ms
        };

        Duration::from_millis(delay_ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2, Duration::from_secs(1), Duration::from_secs(30))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn zero_base_delay_never_waits() {
        let policy = RetryPolicy::new(3, Duration::ZERO, Duration::from_secs(10));
        assert_eq!(policy.delay_for(0), Duration::ZERO);
        assert_eq!(policy.delay_for(5), Duration::ZERO);
    }

    #[test]
    fn max_attempts_counts_the_first_try() {
        assert_eq!(RetryPolicy::default().max_attempts(), 3);
    }

    proptest! {
        #[test]
        fn delay_stays_within_jitter_band(attempt in 0u32..20) {
            let policy = RetryPolicy::new(5, Duration::from_millis(1000), Duration::from_millis(30_000));
            let nominal = (1000u64 << attempt.min(15)).min(30_000);
            let delay = policy.delay_for(attempt).as_millis() as u64;
            prop_assert!(delay >= nominal - nominal / 4);
            prop_assert!(delay <= nominal + nominal / 4);
        }
    }
}
