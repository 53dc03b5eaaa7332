// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the [`ListingStore`] trait.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::OnceCell;
use tracing::debug;

use frilans_config::model::StorageConfig;
use frilans_core::types::{
    AuditEvent, FailedDelivery, Listing, ListingId, PurgeReport, StoreStats, StoredListing,
    SubscriberProfile, UserId,
};
use frilans_core::{
    Adapter, AdapterType, FrilansError, HealthStatus, ListingStore, ProfileMutation,
};

use crate::database::{Database, map_tr_err};
use crate::queries;
use crate::queries::profiles::DigestDefault;

/// SQLite-backed listing store.
///
/// The database is opened lazily by [`ListingStore::initialize`]; every
/// other call fails with [`FrilansError::Persistence`] until then.
pub struct SqliteStore {
    config: StorageConfig,
    digest_default: DigestDefault,
    db: OnceCell<Database>,
}

impl SqliteStore {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            digest_default: DigestDefault::default(),
            db: OnceCell::new(),
        }
    }

    /// Digest time assigned to profiles created by their first mutation.
    pub fn with_digest_default(mut self, hour: u8, minute: u8) -> Self {
        self.digest_default = DigestDefault { hour, minute };
        self
    }

    fn db(&self) -> Result<&Database, FrilansError> {
        self.db.get().ok_or_else(|| FrilansError::Persistence {
            source: "store not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl Adapter for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Store
    }

    async fn health_check(&self) -> Result<HealthStatus, FrilansError> {
        self.db()?
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> { conn.execute_batch("SELECT 1;") })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), FrilansError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl ListingStore for SqliteStore {
    async fn initialize(&self) -> Result<(), FrilansError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| FrilansError::Persistence {
            source: "store already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite store initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), FrilansError> {
        self.db()?.checkpoint().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    // --- Listings ---

    async fn upsert_if_absent(&self, listing: &Listing) -> Result<bool, FrilansError> {
        queries::listings::upsert_if_absent(self.db()?, listing).await
    }

    async fn persist_cycle(
        &self,
        listings: Vec<Listing>,
    ) -> Result<Vec<StoredListing>, FrilansError> {
        queries::listings::persist_cycle(self.db()?, listings).await
    }

    async fn get_listing(&self, id: ListingId) -> Result<Option<StoredListing>, FrilansError> {
        queries::listings::get_listing(self.db()?, id).await
    }

    // --- Profiles ---

    async fn get_active_profiles(&self) -> Result<Vec<SubscriberProfile>, FrilansError> {
        queries::profiles::get_active_profiles(self.db()?).await
    }

    async fn get_profile(
        &self,
        user_id: UserId,
    ) -> Result<Option<SubscriberProfile>, FrilansError> {
        queries::profiles::get_profile(self.db()?, user_id).await
    }

    async fn apply_profile_mutation(
        &self,
        user_id: UserId,
        mutation: ProfileMutation,
    ) -> Result<SubscriberProfile, FrilansError> {
        queries::profiles::apply_mutation(self.db()?, user_id, mutation, self.digest_default).await
    }

    // --- Deliveries ---

    async fn record_delivery(
        &self,
        user_id: UserId,
        listing_id: ListingId,
        channel: &str,
    ) -> Result<bool, FrilansError> {
        queries::deliveries::record_delivery(self.db()?, user_id, listing_id, channel).await
    }

    async fn is_delivered(
        &self,
        user_id: UserId,
        listing_id: ListingId,
    ) -> Result<bool, FrilansError> {
        queries::deliveries::is_delivered(self.db()?, user_id, listing_id).await
    }

    async fn record_failed_delivery(&self, failure: &FailedDelivery) -> Result<(), FrilansError> {
        queries::deliveries::record_failure(self.db()?, failure).await
    }

    async fn recent_failed_deliveries(
        &self,
        limit: usize,
    ) -> Result<Vec<FailedDelivery>, FrilansError> {
        queries::deliveries::recent_failures(self.db()?, limit).await
    }

    // --- Digest ---

    async fn enqueue_digest(
        &self,
        user_id: UserId,
        listing_ids: &[ListingId],
    ) -> Result<usize, FrilansError> {
        queries::digests::enqueue(self.db()?, user_id, listing_ids).await
    }

    async fn pending_digest(&self, user_id: UserId) -> Result<Vec<StoredListing>, FrilansError> {
        queries::digests::pending(self.db()?, user_id).await
    }

    async fn pending_digest_users(&self) -> Result<Vec<UserId>, FrilansError> {
        queries::digests::pending_users(self.db()?).await
    }

    async fn remove_from_digest(
        &self,
        user_id: UserId,
        listing_ids: &[ListingId],
    ) -> Result<(), FrilansError> {
        queries::digests::remove(self.db()?, user_id, listing_ids).await
    }

    async fn mark_digest_sent(&self, user_id: UserId, on: NaiveDate) -> Result<(), FrilansError> {
        queries::profiles::mark_digest_sent(self.db()?, user_id, on).await
    }

    // --- Audit ---

    async fn record_audit_event(&self, event: &AuditEvent) -> Result<(), FrilansError> {
        queries::audit::record(self.db()?, event).await
    }

    async fn recent_audit_events(&self, limit: usize) -> Result<Vec<AuditEvent>, FrilansError> {
        queries::audit::recent(self.db()?, limit).await
    }

    // --- Maintenance ---

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<PurgeReport, FrilansError> {
        queries::maintenance::purge_older_than(self.db()?, cutoff).await
    }

    async fn stats(&self) -> Result<StoreStats, FrilansError> {
        queries::maintenance::stats(self.db()?).await
    }
}
