// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pending digest entries.

use chrono::Utc;
use frilans_core::FrilansError;
use frilans_core::types::{ListingId, StoredListing, UserId};
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::rows::{encode_ts, listing_columns, listing_from_row};

/// Queue listings for a user's next digest, ignoring ones already queued.
pub async fn enqueue(
    db: &Database,
    user_id: UserId,
    listing_ids: &[ListingId],
) -> Result<usize, FrilansError> {
    let ids: Vec<i64> = listing_ids.iter().map(|id| id.0).collect();
    let enqueued_at = encode_ts(&Utc::now());
    db.connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            let tx = conn.transaction()?;
            let mut added = 0;
            {
                let mut stmt = tx.prepare(
                    "INSERT OR IGNORE INTO pending_digest (user_id, listing_id, enqueued_at) \
                     VALUES (?1, ?2, ?3)",
                )?;
                for id in ids {
                    added += stmt.execute(params![user_id.0, id, enqueued_at])?;
                }
            }
            tx.commit()?;
            Ok(added)
        })
        .await
        .map_err(map_tr_err)
}

/// Pending listings for one user, oldest entry first.
pub async fn pending(db: &Database, user_id: UserId) -> Result<Vec<StoredListing>, FrilansError> {
    let sql = format!(
        "SELECT {} FROM pending_digest p JOIN listings l ON l.id = p.listing_id \
         WHERE p.user_id = ?1 ORDER BY p.id",
        listing_columns("l.")
    );
    db.connection()
        .call(move |conn| -> Result<Vec<StoredListing>, rusqlite::Error> {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![user_id.0], listing_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Users with at least one pending entry, ordered by user id.
pub async fn pending_users(db: &Database) -> Result<Vec<UserId>, FrilansError> {
    db.connection()
        .call(|conn| -> Result<Vec<UserId>, rusqlite::Error> {
            let mut stmt =
                conn.prepare("SELECT DISTINCT user_id FROM pending_digest ORDER BY user_id")?;
            let rows = stmt.query_map([], |r| r.get(0).map(UserId))?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn remove(
    db: &Database,
    user_id: UserId,
    listing_ids: &[ListingId],
) -> Result<(), FrilansError> {
    let ids: Vec<i64> = listing_ids.iter().map(|id| id.0).collect();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    "DELETE FROM pending_digest WHERE user_id = ?1 AND listing_id = ?2",
                )?;
                for id in ids {
                    stmt.execute(params![user_id.0, id])?;
                }
            }
            tx.commit()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn count_pending(db: &Database) -> Result<u64, FrilansError> {
    db.connection()
        .call(|conn| -> Result<u64, rusqlite::Error> {
            conn.query_row("SELECT COUNT(*) FROM pending_digest", [], |r| r.get(0))
        })
        .await
        .map_err(map_tr_err)
}
