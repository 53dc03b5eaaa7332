// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Column encodings shared by the query modules.
//!
//! Timestamps are fixed-width UTC text so lexical order equals time order.
//! Sets are JSON arrays; enums use their snake_case names.

use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Row;
use rusqlite::types::Type;
use serde::Serialize;
use serde::de::DeserializeOwned;

use frilans_core::types::{
    AuditEvent, FailedDelivery, Listing, ListingId, NotificationMode, SourceKind, StoredListing,
    SubscriberProfile, UserId,
};

const TS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Column list matching [`listing_from_row`], optionally table-qualified.
pub(crate) fn listing_columns(prefix: &str) -> String {
    [
        "id",
        "source",
        "source_id",
        "title",
        "description",
        "url",
        "budget_min",
        "budget_max",
        "currency",
        "regions",
        "technologies",
        "project_type",
        "experience_level",
        "payment_type",
        "posted_at",
        "fetched_at",
    ]
    .iter()
    .map(|c| format!("{prefix}{c}"))
    .collect::<Vec<_>>()
    .join(", ")
}

pub(crate) const PROFILE_COLUMNS: &str = "user_id, keywords, excluded_keywords, technologies, \
     regions, budget_min, budget_max, project_types, experience_levels, payment_types, \
     notification_mode, digest_hour, digest_minute, subscribed, last_digest_on, \
     created_at, updated_at";

pub(crate) fn encode_ts(ts: &DateTime<Utc>) -> String {
    ts.format(TS_FORMAT).to_string()
}

pub(crate) fn encode_json<T: Serialize>(value: &T) -> rusqlite::Result<String> {
    serde_json::to_string(value).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

fn conversion<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn decode_ts(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion(idx, e))
}

fn decode_opt_ts(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| conversion(idx, e))
    })
    .transpose()
}

fn decode_json<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| conversion(idx, e))
}

fn decode_enum<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = strum::ParseError>,
{
    let raw: String = row.get(idx)?;
    T::from_str(&raw).map_err(|e| conversion(idx, e))
}

pub(crate) fn listing_from_row(row: &Row<'_>) -> rusqlite::Result<StoredListing> {
    Ok(StoredListing {
        id: ListingId(row.get(0)?),
        listing: Listing {
            source: decode_enum::<SourceKind>(row, 1)?,
            source_id: row.get(2)?,
            title: row.get(3)?,
            description: row.get(4)?,
            url: row.get(5)?,
            budget_min: row.get(6)?,
            budget_max: row.get(7)?,
            currency: row.get(8)?,
            regions: decode_json::<BTreeSet<String>>(row, 9)?,
            technologies: decode_json::<BTreeSet<String>>(row, 10)?,
            project_type: decode_enum(row, 11)?,
            experience_level: decode_enum(row, 12)?,
            payment_type: decode_enum(row, 13)?,
            posted_at: decode_opt_ts(row, 14)?,
            fetched_at: decode_ts(row, 15)?,
        },
    })
}

pub(crate) fn profile_from_row(row: &Row<'_>) -> rusqlite::Result<SubscriberProfile> {
    let last_digest_on: Option<String> = row.get(14)?;
    let last_digest_on = last_digest_on
        .map(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|e| conversion(14, e)))
        .transpose()?;

    Ok(SubscriberProfile {
        user_id: UserId(row.get(0)?),
        keywords: decode_json(row, 1)?,
        excluded_keywords: decode_json(row, 2)?,
        technologies: decode_json(row, 3)?,
        regions: decode_json(row, 4)?,
        budget_min: row.get(5)?,
        budget_max: row.get(6)?,
        project_types: decode_json(row, 7)?,
        experience_levels: decode_json(row, 8)?,
        payment_types: decode_json(row, 9)?,
        notification_mode: decode_enum::<NotificationMode>(row, 10)?,
        digest_hour: row.get(11)?,
        digest_minute: row.get(12)?,
        subscribed: row.get(13)?,
        last_digest_on,
        created_at: decode_ts(row, 15)?,
        updated_at: decode_ts(row, 16)?,
    })
}

pub(crate) fn failure_from_row(row: &Row<'_>) -> rusqlite::Result<FailedDelivery> {
    let ids: Vec<i64> = decode_json(row, 1)?;
    Ok(FailedDelivery {
        user_id: UserId(row.get(0)?),
        listing_ids: ids.into_iter().map(ListingId).collect(),
        error: row.get(2)?,
        attempts: row.get(3)?,
        failed_at: decode_ts(row, 4)?,
    })
}

pub(crate) fn audit_from_row(row: &Row<'_>) -> rusqlite::Result<AuditEvent> {
    let user_id: Option<i64> = row.get(1)?;
    Ok(AuditEvent {
        kind: decode_enum(row, 0)?,
        user_id: user_id.map(UserId),
        details: decode_json(row, 2)?,
        recorded_at: decode_ts(row, 3)?,
    })
}
