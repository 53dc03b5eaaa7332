// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Audit trail rows.

use frilans_core::FrilansError;
use frilans_core::types::AuditEvent;
use rusqlite::{Connection, params};

use crate::database::{Database, map_tr_err};
use crate::rows::{audit_from_row, encode_json, encode_ts};

/// Insert one event on an open connection or transaction.
///
/// Used directly by writes that must commit together with their audit row.
pub(crate) fn insert_event(conn: &Connection, event: &AuditEvent) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO audit_events (kind, user_id, details, recorded_at) VALUES (?1, ?2, ?3, ?4)",
        params![
            event.kind.to_string(),
            event.user_id.map(|u| u.0),
            encode_json(&event.details)?,
            encode_ts(&event.recorded_at),
        ],
    )?;
    Ok(())
}

pub async fn record(db: &Database, event: &AuditEvent) -> Result<(), FrilansError> {
    let event = event.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> { insert_event(conn, &event) })
        .await
        .map_err(map_tr_err)
}

/// Newest events first.
pub async fn recent(db: &Database, limit: usize) -> Result<Vec<AuditEvent>, FrilansError> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| -> Result<Vec<AuditEvent>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT kind, user_id, details, recorded_at \
                 FROM audit_events ORDER BY id DESC LIMIT ?1",
            )?;
            let rows = stmt.query_map(params![limit], audit_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn count_events(db: &Database) -> Result<u64, FrilansError> {
    db.connection()
        .call(|conn| -> Result<u64, rusqlite::Error> {
            conn.query_row("SELECT COUNT(*) FROM audit_events", [], |r| r.get(0))
        })
        .await
        .map_err(map_tr_err)
}
