// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One fetcher, one cycle: timeout per attempt, bounded retries.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, warn};

use frilans_core::types::{RawListing, SourceKind};
use frilans_core::{FrilansError, RetryPolicy, SourceFetcher};

/// How a fetcher fared in one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SourceStatus {
    Healthy,
    /// Retries exhausted on a transient failure; skipped for this cycle.
    Degraded,
    /// The source payload no longer parses; skipped without retrying.
    FormatChanged,
}

/// Per-fetcher entry of a cycle report.
#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub fetcher: String,
    pub source: SourceKind,
    pub status: SourceStatus,
    pub attempts: u32,
    pub listings: usize,
    pub error: Option<String>,
}

/// Run `fetcher` until it succeeds, fails permanently, or runs out of attempts.
///
/// Never returns an error: a failed fetcher contributes zero listings and a
/// non-healthy report.
pub async fn fetch_with_retry(
    fetcher: &dyn SourceFetcher,
    timeout: Duration,
    policy: RetryPolicy,
) -> (Vec<RawListing>, SourceReport) {
    let source = fetcher.source();
    let mut report = SourceReport {
        fetcher: fetcher.name().to_string(),
        source,
        status: SourceStatus::Healthy,
        attempts: 0,
        listings: 0,
        error: None,
    };

    let max_attempts = policy.max_attempts();
    for attempt in 0..max_attempts {
        report.attempts = attempt + 1;
        let err = match tokio::time::timeout(timeout, fetcher.fetch()).await {
            Ok(Ok(listings)) => {
                debug!(%source, attempt = attempt + 1, count = listings.len(), "fetch succeeded");
                report.listings = listings.len();
                return (listings, report);
            }
            Ok(Err(e)) => e,
            Err(_) => FrilansError::Timeout { duration: timeout },
        };

        if !err.is_retryable() {
            error!(%source, fetcher = %report.fetcher, error = %err, "source format changed; skipping for this cycle");
            report.status = SourceStatus::FormatChanged;
            report.error = Some(err.to_string());
            return (Vec::new(), report);
        }

        if attempt + 1 < max_attempts {
            let delay = policy.delay_for(attempt);
            warn!(
                %source,
                attempt = attempt + 1,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "fetch failed, retrying"
            );
            tokio::time::sleep(delay).await;
        } else {
            warn!(
                %source,
                fetcher = %report.fetcher,
                attempts = max_attempts,
                error = %err,
                "source degraded; no listings this cycle"
            );
            report.status = SourceStatus::Degraded;
            report.error = Some(err.to_string());
        }
    }

    (Vec::new(), report)
}
