// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Listing inserts and lookups.

use frilans_core::FrilansError;
use frilans_core::types::{Listing, ListingId, StoredListing};
use rusqlite::{Connection, OptionalExtension, params};

use crate::database::{Database, map_tr_err};
use crate::rows::{encode_json, encode_ts, listing_columns, listing_from_row};

/// Insert unless `(source, source_id)` exists. Returns the new row id, if any.
fn insert_if_absent(conn: &Connection, listing: &Listing) -> rusqlite::Result<Option<i64>> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO listings (source, source_id, title, description, url, \
         budget_min, budget_max, currency, regions, technologies, project_type, \
         experience_level, payment_type, posted_at, fetched_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            listing.source.to_string(),
            listing.source_id,
            listing.title,
            listing.description,
            listing.url,
            listing.budget_min,
            listing.budget_max,
            listing.currency,
            encode_json(&listing.regions)?,
            encode_json(&listing.technologies)?,
            listing.project_type.to_string(),
            listing.experience_level.to_string(),
            listing.payment_type.to_string(),
            listing.posted_at.as_ref().map(encode_ts),
            encode_ts(&listing.fetched_at),
        ],
    )?;
    Ok((changed == 1).then(|| conn.last_insert_rowid()))
}

/// Insert a single listing unless it is already known.
pub async fn upsert_if_absent(db: &Database, listing: &Listing) -> Result<bool, FrilansError> {
    let listing = listing.clone();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            Ok(insert_if_absent(conn, &listing)?.is_some())
        })
        .await
        .map_err(map_tr_err)
}

/// Insert a cycle's listings in one transaction, returning only the new ones.
///
/// Any error rolls back the whole batch.
pub async fn persist_cycle(
    db: &Database,
    listings: Vec<Listing>,
) -> Result<Vec<StoredListing>, FrilansError> {
    db.connection()
        .call(move |conn| -> Result<Vec<StoredListing>, rusqlite::Error> {
            let tx = conn.transaction()?;
            let mut inserted = Vec::new();
            for listing in listings {
                if let Some(id) = insert_if_absent(&tx, &listing)? {
                    inserted.push(StoredListing {
                        id: ListingId(id),
                        listing,
                    });
                }
            }
            tx.commit()?;
            Ok(inserted)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_listing(
    db: &Database,
    id: ListingId,
) -> Result<Option<StoredListing>, FrilansError> {
    let sql = format!("SELECT {} FROM listings WHERE id = ?1", listing_columns(""));
    db.connection()
        .call(move |conn| -> Result<Option<StoredListing>, rusqlite::Error> {
            conn.query_row(&sql, params![id.0], listing_from_row)
                .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn count_listings(db: &Database) -> Result<u64, FrilansError> {
    db.connection()
        .call(|conn| -> Result<u64, rusqlite::Error> {
            conn.query_row("SELECT COUNT(*) FROM listings", [], |r| r.get(0))
        })
        .await
        .map_err(map_tr_err)
}
