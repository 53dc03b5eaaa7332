// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One pass of each scheduled job.

use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::{error, info, warn};

use frilans_collector::{Collector, CycleReport};
use frilans_config::model::FrilansConfig;
use frilans_core::types::{AuditEvent, AuditKind, PurgeReport};
use frilans_core::{FrilansError, ListingStore, MessageSender, SourceFetcher};
use frilans_dispatch::{DigestReport, DispatchReport, Dispatcher};
use frilans_filter::match_cycle;

/// Result of a fetch cycle followed by instant dispatch.
#[derive(Debug, Clone, Serialize)]
pub struct CycleOutcome {
    pub cycle: CycleReport,
    /// Subscribers with at least one match this cycle.
    pub matched_users: usize,
    pub dispatch: DispatchReport,
}

/// Collector, filter, and dispatcher bound to one store and one sender.
pub struct Pipeline {
    collector: Collector,
    dispatcher: Dispatcher,
    store: Arc<dyn ListingStore>,
    config: FrilansConfig,
}

impl Pipeline {
    pub fn new(
        fetchers: Vec<Arc<dyn SourceFetcher>>,
        store: Arc<dyn ListingStore>,
        sender: Arc<dyn MessageSender>,
        config: FrilansConfig,
    ) -> Self {
        Self {
            collector: Collector::new(fetchers, store.clone(), &config.collector),
            dispatcher: Dispatcher::new(store.clone(), sender, &config.dispatch),
            store,
            config,
        }
    }

    pub fn config(&self) -> &FrilansConfig {
        &self.config
    }

    pub fn collector(&self) -> &Collector {
        &self.collector
    }

    /// Load profiles, then fetch, persist, match, and deliver.
    ///
    /// Profiles are read before anything is committed, so a failed read
    /// leaves the cycle's listings new for the next run. A persistence
    /// failure aborts the cycle the same way. Either failure is written to
    /// the audit trail when the store still accepts writes.
    pub async fn run_cycle(&self) -> Result<CycleOutcome, FrilansError> {
        let result = self.fetch_and_dispatch().await;
        if let Err(e) = &result {
            let event = AuditEvent::new(
                AuditKind::CycleFailed,
                None,
                json!({ "error": e.to_string() }),
            );
            if let Err(audit_err) = self.store.record_audit_event(&event).await {
                warn!(error = %audit_err, "could not record cycle failure");
            }
        }
        result
    }

    async fn fetch_and_dispatch(&self) -> Result<CycleOutcome, FrilansError> {
        let profiles = self.store.get_active_profiles().await.map_err(|e| {
            error!(error = %e, "could not load profiles; skipping fetch cycle");
            e
        })?;

        let cycle = self.collector.run_cycle().await?;
        if cycle.new_listings.is_empty() {
            return Ok(CycleOutcome {
                cycle,
                matched_users: 0,
                dispatch: DispatchReport::default(),
            });
        }

        let matches = match_cycle(&cycle.new_listings, &profiles);
        let matched_users = matches.len();
        let dispatch = self.dispatcher.dispatch_cycle(matches, &profiles).await;

        info!(
            cycle_id = %cycle.cycle_id,
            new = cycle.new_listings.len(),
            matched_users,
            sent = dispatch.messages_sent,
            "cycle dispatched"
        );
        Ok(CycleOutcome {
            cycle,
            matched_users,
            dispatch,
        })
    }

    /// Send every daily digest due at `now` in the configured timezone.
    pub async fn run_digest(&self, now: DateTime<Utc>) -> DigestReport {
        self.dispatcher
            .run_digest_tick(now, self.config.digest.tz())
            .await
    }

    /// Drop data older than the retention window, measured back from `now`.
    pub async fn purge(&self, now: DateTime<Utc>) -> Result<PurgeReport, FrilansError> {
        let cutoff = now - ChronoDuration::days(i64::from(self.config.retention.retention_days));
        let report = self.store.purge_older_than(cutoff).await?;
        info!(
            %cutoff,
            listings = report.listings_removed,
            deliveries = report.deliveries_removed,
            failures = report.failures_removed,
            audit_events = report.audit_events_removed,
            retained = report.listings_retained,
            "retention purge complete"
        );
        Ok(report)
    }
}
