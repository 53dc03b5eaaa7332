// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Store wrapper that fails chosen reads on demand.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use frilans_core::types::{
    AdapterType, AuditEvent, FailedDelivery, HealthStatus, Listing, ListingId, PurgeReport,
    StoreStats, StoredListing, SubscriberProfile, UserId,
};
use frilans_core::{Adapter, FrilansError, ListingStore, ProfileMutation};

/// Delegates to an inner store, except that the next `n` calls to
/// [`ListingStore::get_active_profiles`] fail after
/// [`fail_profile_reads`](Self::fail_profile_reads).
pub struct FlakyStore {
    inner: Arc<dyn ListingStore>,
    profile_read_failures: AtomicU32,
}

impl FlakyStore {
    pub fn new(inner: Arc<dyn ListingStore>) -> Self {
        Self {
            inner,
            profile_read_failures: AtomicU32::new(0),
        }
    }

    pub fn fail_profile_reads(&self, n: u32) {
        self.profile_read_failures.store(n, Ordering::SeqCst);
    }

    fn take_failure(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl Adapter for FlakyStore {
    fn name(&self) -> &str {
        "flaky-store"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Store
    }

    async fn health_check(&self) -> Result<HealthStatus, FrilansError> {
        self.inner.health_check().await
    }
}

#[async_trait]
impl ListingStore for FlakyStore {
    async fn initialize(&self) -> Result<(), FrilansError> {
        self.inner.initialize().await
    }

    async fn close(&self) -> Result<(), FrilansError> {
        self.inner.close().await
    }

    async fn upsert_if_absent(&self, listing: &Listing) -> Result<bool, FrilansError> {
        self.inner.upsert_if_absent(listing).await
    }

    async fn persist_cycle(
        &self,
        listings: Vec<Listing>,
    ) -> Result<Vec<StoredListing>, FrilansError> {
        self.inner.persist_cycle(listings).await
    }

    async fn get_listing(&self, id: ListingId) -> Result<Option<StoredListing>, FrilansError> {
        self.inner.get_listing(id).await
    }

    async fn get_active_profiles(&self) -> Result<Vec<SubscriberProfile>, FrilansError> {
        if Self::take_failure(&self.profile_read_failures) {
            return Err(FrilansError::Persistence {
                source: "injected profile read failure".into(),
            });
        }
        self.inner.get_active_profiles().await
    }

    async fn get_profile(
        &self,
        user_id: UserId,
    ) -> Result<Option<SubscriberProfile>, FrilansError> {
        self.inner.get_profile(user_id).await
    }

    async fn apply_profile_mutation(
        &self,
        user_id: UserId,
        mutation: ProfileMutation,
    ) -> Result<SubscriberProfile, FrilansError> {
        self.inner.apply_profile_mutation(user_id, mutation).await
    }

    async fn record_delivery(
        &self,
        user_id: UserId,
        listing_id: ListingId,
        channel: &str,
    ) -> Result<bool, FrilansError> {
        self.inner.record_delivery(user_id, listing_id, channel).await
    }

    async fn is_delivered(
        &self,
        user_id: UserId,
        listing_id: ListingId,
    ) -> Result<bool, FrilansError> {
        self.inner.is_delivered(user_id, listing_id).await
    }

    async fn record_failed_delivery(&self, failure: &FailedDelivery) -> Result<(), FrilansError> {
        self.inner.record_failed_delivery(failure).await
    }

    async fn recent_failed_deliveries(
        &self,
        limit: usize,
    ) -> Result<Vec<FailedDelivery>, FrilansError> {
        self.inner.recent_failed_deliveries(limit).await
    }

    async fn enqueue_digest(
        &self,
        user_id: UserId,
        listing_ids: &[ListingId],
    ) -> Result<usize, FrilansError> {
        self.inner.enqueue_digest(user_id, listing_ids).await
    }

    async fn pending_digest(&self, user_id: UserId) -> Result<Vec<StoredListing>, FrilansError> {
        self.inner.pending_digest(user_id).await
    }

    async fn pending_digest_users(&self) -> Result<Vec<UserId>, FrilansError> {
        self.inner.pending_digest_users().await
    }

    async fn remove_from_digest(
        &self,
        user_id: UserId,
        listing_ids: &[ListingId],
    ) -> Result<(), FrilansError> {
        self.inner.remove_from_digest(user_id, listing_ids).await
    }

    async fn mark_digest_sent(&self, user_id: UserId, on: NaiveDate) -> Result<(), FrilansError> {
        self.inner.mark_digest_sent(user_id, on).await
    }

    async fn record_audit_event(&self, event: &AuditEvent) -> Result<(), FrilansError> {
        self.inner.record_audit_event(event).await
    }

    async fn recent_audit_events(&self, limit: usize) -> Result<Vec<AuditEvent>, FrilansError> {
        self.inner.recent_audit_events(limit).await
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<PurgeReport, FrilansError> {
        self.inner.purge_older_than(cutoff).await
    }

    async fn stats(&self) -> Result<StoreStats, FrilansError> {
        self.inner.stats().await
    }
}
