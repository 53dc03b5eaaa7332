// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end pipeline tests.
//!
//! `TestHarness` owns an initialized SQLite store in a temp directory, a
//! [`RecordingSender`], and a configuration tuned for tests: retry delays
//! of a few milliseconds and no send spacing.

use std::sync::Arc;

use frilans_config::model::{FrilansConfig, StorageConfig};
use frilans_core::types::{SubscriberProfile, UserId};
use frilans_core::{FrilansError, ListingStore, ProfileMutation};
use frilans_storage::SqliteStore;

use crate::recording_sender::RecordingSender;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    config: FrilansConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        let mut config = FrilansConfig::default();
        config.collector.fetch_timeout_secs = 1;
        config.collector.retry_base_delay_ms = 1;
        config.collector.retry_max_delay_ms = 4;
        config.dispatch.retry_base_delay_ms = 1;
        config.dispatch.retry_max_delay_ms = 4;
        config.dispatch.min_send_interval_ms = 0;
        Self { config }
    }

    /// Adjust the configuration before the store is opened.
    pub fn with_config(mut self, f: impl FnOnce(&mut FrilansConfig)) -> Self {
        f(&mut self.config);
        self
    }

    /// Build the test harness, creating and migrating a temp database.
    pub async fn build(mut self) -> Result<TestHarness, FrilansError> {
        let temp_dir = tempfile::TempDir::new().map_err(|e| FrilansError::Persistence {
            source: Box::new(e),
        })?;
        let db_path = temp_dir.path().join("test.db");
        self.config.storage = StorageConfig {
            database_path: db_path.to_string_lossy().into_owned(),
            wal_mode: true,
        };

        let store = SqliteStore::new(self.config.storage.clone()).with_digest_default(
            self.config.digest.default_hour,
            self.config.digest.default_minute,
        );
        store.initialize().await?;

        Ok(TestHarness {
            store: Arc::new(store),
            sender: Arc::new(RecordingSender::new()),
            config: self.config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with a recording sender and temp storage.
pub struct TestHarness {
    /// SQLite store (temp DB, cleaned up on drop).
    pub store: Arc<SqliteStore>,
    /// Captures outbound messages.
    pub sender: Arc<RecordingSender>,
    pub config: FrilansConfig,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// The store as a trait object, the way pipeline components hold it.
    pub fn store(&self) -> Arc<dyn ListingStore> {
        self.store.clone()
    }

    /// Subscribe `user_id` and apply each mutation in order.
    pub async fn subscriber(
        &self,
        user_id: i64,
        mutations: Vec<ProfileMutation>,
    ) -> Result<SubscriberProfile, FrilansError> {
        let user_id = UserId(user_id);
        let mut profile = self
            .store
            .apply_profile_mutation(user_id, ProfileMutation::Subscribe)
            .await?;
        for mutation in mutations {
            profile = self.store.apply_profile_mutation(user_id, mutation).await?;
        }
        Ok(profile)
    }
}
