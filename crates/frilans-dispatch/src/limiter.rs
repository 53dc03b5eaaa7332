// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound send throttling: a concurrency cap plus minimum spacing.

use std::time::Duration;

use tokio::sync::{Mutex, Semaphore, SemaphorePermit};
use tokio::time::Instant;

use frilans_core::FrilansError;

pub struct SendLimiter {
    permits: Semaphore,
    min_interval: Duration,
    next_slot: Mutex<Instant>,
}

impl SendLimiter {
    pub fn new(max_concurrent: usize, min_interval: Duration) -> Self {
        Self {
            permits: Semaphore::new(max_concurrent.max(1)),
            min_interval,
            next_slot: Mutex::new(Instant::now()),
        }
    }

    /// Wait for a free send slot. Hold the permit for the duration of the send.
    pub async fn acquire(&self) -> Result<SemaphorePermit<'_>, FrilansError> {
        let permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| FrilansError::Internal("send limiter closed".into()))?;

        let start = {
            let mut next = self.next_slot.lock().await;
            let start = (*next).max(Instant::now());
            *next = start + self.min_interval;
            start
        };
        tokio::time::sleep_until(start).await;
        Ok(permit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn sends_are_spaced() {
        let limiter = SendLimiter::new(4, Duration::from_millis(100));
        let begin = Instant::now();
        for _ in 0..3 {
            drop(limiter.acquire().await.unwrap());
        }
        assert!(begin.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test]
    async fn concurrency_is_capped() {
        let limiter = SendLimiter::new(2, Duration::ZERO);
        let a = limiter.acquire().await.unwrap();
        let _b = limiter.acquire().await.unwrap();
        assert_eq!(limiter.permits.available_permits(), 0);
        drop(a);
        assert_eq!(limiter.permits.available_permits(), 1);
    }
}
