// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot `cycle`, `digest`, and `purge` commands.

use chrono::Utc;
use frilans_config::FrilansConfig;
use frilans_core::{FrilansError, ListingStore};
use serde::Serialize;

use crate::serve::{build_pipeline, open_store, telegram_sender};

fn print_json<T: Serialize>(value: &T) -> Result<(), FrilansError> {
    let out = serde_json::to_string_pretty(value)
        .map_err(|e| FrilansError::Internal(format!("failed to serialize report: {e}")))?;
    println!("{out}");
    Ok(())
}

pub async fn run_cycle_once(config: FrilansConfig, json: bool) -> Result<(), FrilansError> {
    let (store, pipeline) = build_pipeline(&config, telegram_sender(&config)?).await?;
    let outcome = pipeline.run_cycle().await;
    store.close().await?;
    let outcome = outcome?;

    if json {
        return print_json(&outcome);
    }
    println!(
        "cycle {}: {} fetched, {} new, {} subscriber(s) matched, {} message(s) sent, {} failed",
        outcome.cycle.cycle_id,
        outcome.cycle.fetched,
        outcome.cycle.new_listings.len(),
        outcome.matched_users,
        outcome.dispatch.messages_sent,
        outcome.dispatch.failed_messages,
    );
    for source in outcome.cycle.degraded_sources() {
        println!(
            "  {} {}: {}",
            source.fetcher,
            source.status,
            source.error.as_deref().unwrap_or("no detail")
        );
    }
    Ok(())
}

pub async fn run_digest_once(config: FrilansConfig, json: bool) -> Result<(), FrilansError> {
    let (store, pipeline) = build_pipeline(&config, telegram_sender(&config)?).await?;
    let report = pipeline.run_digest(Utc::now()).await;
    store.close().await?;

    if json {
        return print_json(&report);
    }
    println!(
        "digest: {} due, {} empty, {} message(s) sent, {} failed; {} queued listing(s) sent instantly, {} dropped",
        report.due,
        report.empty,
        report.delivery.messages_sent,
        report.delivery.failed_messages,
        report.redirected,
        report.dropped,
    );
    Ok(())
}

/// Purging needs no sender, so it runs without a bot token.
pub async fn run_purge_once(config: FrilansConfig, json: bool) -> Result<(), FrilansError> {
    let store = open_store(&config).await?;
    let cutoff = Utc::now() - chrono::Duration::days(i64::from(config.retention.retention_days));
    let report = store.purge_older_than(cutoff).await;
    store.close().await?;
    let report = report?;

    if json {
        return print_json(&report);
    }
    println!(
        "purged {} listing(s), {} delivery record(s), {} failure(s), {} audit entry(ies); kept {} listing(s) pending digest",
        report.listings_removed,
        report.deliveries_removed,
        report.failures_removed,
        report.audit_events_removed,
        report.listings_retained,
    );
    Ok(())
}
