// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence contract for listings, profiles, and delivery state.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::FrilansError;
use crate::profile::ProfileMutation;
use crate::traits::adapter::Adapter;
use crate::types::{
    AuditEvent, FailedDelivery, Listing, ListingId, PurgeReport, StoreStats, StoredListing,
    SubscriberProfile, UserId,
};

/// The durable record of seen listings and subscriber state.
///
/// The store is the only owner of persisted state; every other component
/// works on request-scoped copies.
#[async_trait]
pub trait ListingStore: Adapter {
    /// Open the backing database and apply pending migrations.
    async fn initialize(&self) -> Result<(), FrilansError>;

    /// Flush and close the backing database.
    async fn close(&self) -> Result<(), FrilansError>;

    // --- Listings ---

    /// Insert the listing unless its `(source, source_id)` already exists.
    ///
    /// Returns `true` only when a new row was written.
    async fn upsert_if_absent(&self, listing: &Listing) -> Result<bool, FrilansError>;

    /// Insert-if-absent for a whole cycle inside one transaction.
    ///
    /// Returns the newly inserted listings in input order. On error nothing
    /// from the batch is committed.
    async fn persist_cycle(
        &self,
        listings: Vec<Listing>,
    ) -> Result<Vec<StoredListing>, FrilansError>;

    async fn get_listing(&self, id: ListingId) -> Result<Option<StoredListing>, FrilansError>;

    // --- Profiles ---

    /// All profiles with `subscribed = true`.
    async fn get_active_profiles(&self) -> Result<Vec<SubscriberProfile>, FrilansError>;

    async fn get_profile(&self, user_id: UserId)
    -> Result<Option<SubscriberProfile>, FrilansError>;

    /// Apply one mutation atomically, creating the profile on first use.
    ///
    /// A rejected mutation leaves the stored profile untouched.
    async fn apply_profile_mutation(
        &self,
        user_id: UserId,
        mutation: ProfileMutation,
    ) -> Result<SubscriberProfile, FrilansError>;

    // --- Deliveries ---

    /// Record a confirmed delivery. Returns `false` if one already exists.
    async fn record_delivery(
        &self,
        user_id: UserId,
        listing_id: ListingId,
        channel: &str,
    ) -> Result<bool, FrilansError>;

    async fn is_delivered(
        &self,
        user_id: UserId,
        listing_id: ListingId,
    ) -> Result<bool, FrilansError>;

    /// Record a permanent failure together with its audit entry.
    async fn record_failed_delivery(&self, failure: &FailedDelivery) -> Result<(), FrilansError>;

    /// Most recent permanent failures, newest first.
    async fn recent_failed_deliveries(
        &self,
        limit: usize,
    ) -> Result<Vec<FailedDelivery>, FrilansError>;

    // --- Digest ---

    /// Add listings to a subscriber's pending digest. Returns how many were new.
    async fn enqueue_digest(
        &self,
        user_id: UserId,
        listing_ids: &[ListingId],
    ) -> Result<usize, FrilansError>;

    /// Pending digest listings in the order they were enqueued.
    async fn pending_digest(&self, user_id: UserId) -> Result<Vec<StoredListing>, FrilansError>;

    /// Every user with at least one pending digest entry, in user id order.
    async fn pending_digest_users(&self) -> Result<Vec<UserId>, FrilansError>;

    async fn remove_from_digest(
        &self,
        user_id: UserId,
        listing_ids: &[ListingId],
    ) -> Result<(), FrilansError>;

    /// Remember the local date the subscriber's digest was sent on.
    async fn mark_digest_sent(&self, user_id: UserId, on: NaiveDate) -> Result<(), FrilansError>;

    // --- Audit ---

    async fn record_audit_event(&self, event: &AuditEvent) -> Result<(), FrilansError>;

    /// Most recent audit entries, newest first.
    async fn recent_audit_events(&self, limit: usize) -> Result<Vec<AuditEvent>, FrilansError>;

    // --- Maintenance ---

    /// Remove listings, delivery records, failures, and audit entries older
    /// than `cutoff`.
    ///
    /// A listing still referenced by a pending digest is never removed.
    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<PurgeReport, FrilansError>;

    async fn stats(&self) -> Result<StoreStats, FrilansError>;
}
