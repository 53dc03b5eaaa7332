// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The fetch cycle.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use frilans_config::model::CollectorConfig;
use frilans_core::types::StoredListing;
use frilans_core::{FrilansError, ListingStore, RetryPolicy, SourceFetcher};

use crate::fetch::{SourceReport, SourceStatus, fetch_with_retry};
use crate::normalize::normalize;

/// Everything a completed cycle hands downstream.
///
/// `new_listings` is the single emission point: only listings committed in
/// this cycle appear here, each with its store id.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub cycle_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub sources: Vec<SourceReport>,
    /// Raw listings returned by all fetchers.
    pub fetched: usize,
    /// Raw listings dropped for a blank source id.
    pub invalid: usize,
    /// Listings repeated within this cycle's own fetch results.
    pub duplicates_in_cycle: usize,
    pub new_listings: Vec<StoredListing>,
}

impl CycleReport {
    pub fn degraded_sources(&self) -> impl Iterator<Item = &SourceReport> {
        self.sources
            .iter()
            .filter(|s| s.status != SourceStatus::Healthy)
    }
}

/// Coordinates all registered fetchers against one store.
pub struct Collector {
    fetchers: Vec<Arc<dyn SourceFetcher>>,
    store: Arc<dyn ListingStore>,
    fetch_timeout: Duration,
    retry: RetryPolicy,
}

impl Collector {
    pub fn new(
        fetchers: Vec<Arc<dyn SourceFetcher>>,
        store: Arc<dyn ListingStore>,
        config: &CollectorConfig,
    ) -> Self {
        Self {
            fetchers,
            store,
            fetch_timeout: config.fetch_timeout(),
            retry: RetryPolicy::new(
                config.max_retries,
                Duration::from_millis(config.retry_base_delay_ms),
                Duration::from_millis(config.retry_max_delay_ms),
            ),
        }
    }

    pub fn fetchers(&self) -> &[Arc<dyn SourceFetcher>] {
        &self.fetchers
    }

    /// Run one cycle: fetch, normalize, dedup, persist, emit.
    ///
    /// All fetchers finish (or give up) before anything is normalized. A
    /// persistence failure rolls back the whole cycle and is returned; the
    /// next cycle starts clean.
    pub async fn run_cycle(&self) -> Result<CycleReport, FrilansError> {
        let cycle_id = Uuid::new_v4();
        let started_at = Utc::now();
        if self.fetchers.is_empty() {
            warn!(%cycle_id, "no source fetchers registered");
        }

        let results = join_all(
            self.fetchers
                .iter()
                .map(|f| fetch_with_retry(f.as_ref(), self.fetch_timeout, self.retry)),
        )
        .await;

        let fetched_at = Utc::now();
        let mut sources = Vec::with_capacity(results.len());
        let mut seen = HashSet::new();
        let mut batch = Vec::new();
        let (mut fetched, mut invalid, mut duplicates_in_cycle) = (0, 0, 0);

        for (raws, report) in results {
            fetched += raws.len();
            for raw in raws {
                let Some(listing) = normalize(report.source, raw, fetched_at) else {
                    invalid += 1;
                    continue;
                };
                if seen.insert(listing.key()) {
                    batch.push(listing);
                } else {
                    duplicates_in_cycle += 1;
                }
            }
            sources.push(report);
        }

        let new_listings = match self.store.persist_cycle(batch).await {
            Ok(stored) => stored,
            Err(e) => {
                error!(%cycle_id, error = %e, "cycle persistence failed; nothing emitted");
                return Err(e);
            }
        };

        let report = CycleReport {
            cycle_id,
            started_at,
            sources,
            fetched,
            invalid,
            duplicates_in_cycle,
            new_listings,
        };
        info!(
            %cycle_id,
            fetched,
            new = report.new_listings.len(),
            degraded = report.degraded_sources().count(),
            "fetch cycle complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frilans_core::types::{RawListing, SourceKind};
    use frilans_test_utils::{Script, ScriptedFetcher, TestHarness};

    fn collector(h: &TestHarness, fetchers: Vec<Arc<dyn SourceFetcher>>) -> Collector {
        Collector::new(fetchers, h.store(), &h.config.collector)
    }

    #[tokio::test]
    async fn duplicates_within_cycle_keep_first() {
        let h = TestHarness::builder().build().await.unwrap();
        let mut second = RawListing::new("7", "Second title");
        second.description = Some("later copy".into());
        let fetcher: Arc<dyn SourceFetcher> = Arc::new(ScriptedFetcher::always(
            SourceKind::FlRu,
            vec![RawListing::new("7", "First title"), second, RawListing::new("", "x")],
        ));

        let report = collector(&h, vec![fetcher]).run_cycle().await.unwrap();
        assert_eq!(report.fetched, 3);
        assert_eq!(report.invalid, 1);
        assert_eq!(report.duplicates_in_cycle, 1);
        assert_eq!(report.new_listings.len(), 1);
        assert_eq!(report.new_listings[0].listing.title, "First title");
    }

    #[tokio::test]
    async fn same_id_from_two_sources_is_two_listings() {
        let h = TestHarness::builder().build().await.unwrap();
        let a: Arc<dyn SourceFetcher> = Arc::new(ScriptedFetcher::always(
            SourceKind::FlRu,
            vec![RawListing::new("1", "A")],
        ));
        let b: Arc<dyn SourceFetcher> = Arc::new(ScriptedFetcher::always(
            SourceKind::Weblancer,
            vec![RawListing::new("1", "B")],
        ));
        let report = collector(&h, vec![a, b]).run_cycle().await.unwrap();
        assert_eq!(report.new_listings.len(), 2);
    }

    #[tokio::test]
    async fn second_identical_cycle_emits_nothing() {
        let h = TestHarness::builder().build().await.unwrap();
        let fetcher: Arc<dyn SourceFetcher> = Arc::new(ScriptedFetcher::always(
            SourceKind::Freemarket,
            vec![RawListing::new("a", "A"), RawListing::new("b", "B")],
        ));
        let c = collector(&h, vec![fetcher]);
        assert_eq!(c.run_cycle().await.unwrap().new_listings.len(), 2);
        assert!(c.run_cycle().await.unwrap().new_listings.is_empty());
    }

    #[tokio::test]
    async fn failing_source_does_not_block_others() {
        let h = TestHarness::builder().build().await.unwrap();
        let good: Arc<dyn SourceFetcher> = Arc::new(ScriptedFetcher::always(
            SourceKind::Github,
            vec![RawListing::new("x", "X")],
        ));
        let bad = Arc::new(ScriptedFetcher::new(
            SourceKind::Telegram,
            vec![Script::Unavailable("flood wait".into())],
        ));

        let report = collector(&h, vec![good, bad.clone() as Arc<dyn SourceFetcher>])
            .run_cycle()
            .await
            .unwrap();
        assert_eq!(report.new_listings.len(), 1);
        let degraded: Vec<_> = report.degraded_sources().collect();
        assert_eq!(degraded.len(), 1);
        assert_eq!(degraded[0].source, SourceKind::Telegram);
        assert_eq!(bad.calls(), 3);
    }

    #[tokio::test]
    async fn persistence_failure_is_fatal_for_the_cycle() {
        let h = TestHarness::builder().build().await.unwrap();
        let store = Arc::new(frilans_storage::SqliteStore::new(h.config.storage.clone()));
        // Never initialized, so every write fails.
        let fetcher: Arc<dyn SourceFetcher> = Arc::new(ScriptedFetcher::always(
            SourceKind::FlRu,
            vec![RawListing::new("1", "A")],
        ));
        let c = Collector::new(vec![fetcher], store, &h.config.collector);
        let err = c.run_cycle().await.unwrap_err();
        assert!(matches!(err, FrilansError::Persistence { .. }));
    }
}
