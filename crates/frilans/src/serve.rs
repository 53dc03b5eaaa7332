// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `frilans serve` command implementation.
//!
//! Opens the store, connects the Telegram sender, and runs the fetch,
//! digest, and purge schedules until SIGINT or SIGTERM.

use std::sync::Arc;

use frilans_config::FrilansConfig;
use frilans_core::types::HealthStatus;
use frilans_core::{Adapter, FrilansError, ListingStore, MessageSender, SourceFetcher};
use frilans_pipeline::{Pipeline, install_signal_handler, scheduler};
use frilans_storage::SqliteStore;
use frilans_telegram::TelegramSender;
use tracing::{info, warn};

/// Open and migrate the configured SQLite store.
pub(crate) async fn open_store(config: &FrilansConfig) -> Result<Arc<SqliteStore>, FrilansError> {
    let store = SqliteStore::new(config.storage.clone())
        .with_digest_default(config.digest.default_hour, config.digest.default_minute);
    store.initialize().await?;
    Ok(Arc::new(store))
}

/// Source fetchers compiled into this build.
///
/// Concrete marketplace scrapers live outside this workspace; a deployment
/// registers its fetchers here.
pub(crate) fn registered_fetchers(_config: &FrilansConfig) -> Vec<Arc<dyn SourceFetcher>> {
    Vec::new()
}

pub(crate) fn telegram_sender(config: &FrilansConfig) -> Result<Arc<TelegramSender>, FrilansError> {
    Ok(Arc::new(TelegramSender::new(&config.telegram)?))
}

/// Open the store and wire a pipeline around it.
pub(crate) async fn build_pipeline(
    config: &FrilansConfig,
    sender: Arc<dyn MessageSender>,
) -> Result<(Arc<SqliteStore>, Arc<Pipeline>), FrilansError> {
    let store = open_store(config).await?;
    let pipeline = Pipeline::new(
        registered_fetchers(config),
        store.clone(),
        sender,
        config.clone(),
    );
    Ok((store, Arc::new(pipeline)))
}

/// Run the daemon until a shutdown signal arrives.
pub async fn run_serve(config: FrilansConfig) -> Result<(), FrilansError> {
    info!("starting frilans serve");

    let sender = telegram_sender(&config)?;
    match sender.health_check().await? {
        HealthStatus::Healthy => info!("telegram bot reachable"),
        HealthStatus::Degraded(msg) | HealthStatus::Unhealthy(msg) => {
            warn!(reason = %msg, "telegram health check failed; sends will be retried");
        }
    }

    let (store, pipeline) = build_pipeline(&config, sender).await?;
    if pipeline.collector().fetchers().is_empty() {
        warn!("no source fetchers registered; fetch cycles will find nothing");
    }
    info!(
        database = %config.storage.database_path,
        timezone = %config.digest.tz(),
        "store ready"
    );

    let cancel = install_signal_handler();
    scheduler::run(pipeline, cancel).await;

    store.close().await?;
    info!("frilans serve shutdown complete");
    Ok(())
}
