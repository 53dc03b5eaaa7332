// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery records and permanent delivery failures.

use chrono::Utc;
use frilans_core::FrilansError;
use frilans_core::types::{AuditEvent, AuditKind, FailedDelivery, ListingId, UserId};
use rusqlite::params;
use serde_json::json;

use crate::database::{Database, map_tr_err};
use crate::queries::audit;
use crate::rows::{encode_json, encode_ts, failure_from_row};

/// Record a confirmed delivery with insert-if-absent semantics.
///
/// The `UNIQUE (user_id, listing_id)` constraint makes this the single
/// point that decides whether a listing has already reached a user.
pub async fn record_delivery(
    db: &Database,
    user_id: UserId,
    listing_id: ListingId,
    channel: &str,
) -> Result<bool, FrilansError> {
    let channel = channel.to_string();
    let delivered_at = encode_ts(&Utc::now());
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let changed = conn.execute(
                "INSERT OR IGNORE INTO deliveries (user_id, listing_id, delivered_at, channel) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![user_id.0, listing_id.0, delivered_at, channel],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn is_delivered(
    db: &Database,
    user_id: UserId,
    listing_id: ListingId,
) -> Result<bool, FrilansError> {
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            conn.query_row(
                "SELECT EXISTS (SELECT 1 FROM deliveries WHERE user_id = ?1 AND listing_id = ?2)",
                params![user_id.0, listing_id.0],
                |r| r.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Store a permanent failure and its `delivery_failed` audit entry together.
pub async fn record_failure(db: &Database, failure: &FailedDelivery) -> Result<(), FrilansError> {
    let failure = failure.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            let ids: Vec<i64> = failure.listing_ids.iter().map(|id| id.0).collect();
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO delivery_failures (user_id, listing_ids, error, attempts, failed_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    failure.user_id.0,
                    encode_json(&ids)?,
                    failure.error,
                    failure.attempts,
                    encode_ts(&failure.failed_at),
                ],
            )?;
            audit::insert_event(
                &tx,
                &AuditEvent {
                    kind: AuditKind::DeliveryFailed,
                    user_id: Some(failure.user_id),
                    details: json!({
                        "listing_ids": ids,
                        "error": failure.error,
                        "attempts": failure.attempts,
                    }),
                    recorded_at: failure.failed_at,
                },
            )?;
            tx.commit()
        })
        .await
        .map_err(map_tr_err)
}

/// Newest failures first.
pub async fn recent_failures(
    db: &Database,
    limit: usize,
) -> Result<Vec<FailedDelivery>, FrilansError> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| -> Result<Vec<FailedDelivery>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT user_id, listing_ids, error, attempts, failed_at \
                 FROM delivery_failures ORDER BY id DESC LIMIT ?1",
            )?;
            let rows = stmt.query_map(params![limit], failure_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// `(deliveries, failures)` row counts.
pub async fn count_deliveries(db: &Database) -> Result<(u64, u64), FrilansError> {
    db.connection()
        .call(|conn| -> Result<(u64, u64), rusqlite::Error> {
            let deliveries = conn.query_row("SELECT COUNT(*) FROM deliveries", [], |r| r.get(0))?;
            let failures =
                conn.query_row("SELECT COUNT(*) FROM delivery_failures", [], |r| r.get(0))?;
            Ok((deliveries, failures))
        })
        .await
        .map_err(map_tr_err)
}
