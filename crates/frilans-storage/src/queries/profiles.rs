// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subscriber profile reads and read-modify-write mutations.

use chrono::{NaiveDate, SubsecRound, Utc};
use frilans_core::types::{AuditEvent, AuditKind, SubscriberProfile, UserId};
use frilans_core::{FrilansError, ProfileMutation};
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::{Value, json};

use crate::database::{Database, map_tr_err};
use crate::queries::audit;
use crate::rows::{PROFILE_COLUMNS, encode_json, encode_ts, profile_from_row};

/// Digest time assigned to profiles created by their first mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigestDefault {
    pub hour: u8,
    pub minute: u8,
}

impl Default for DigestDefault {
    fn default() -> Self {
        Self {
            hour: 10,
            minute: 0,
        }
    }
}

fn select_profile(conn: &Connection, user_id: UserId) -> rusqlite::Result<Option<SubscriberProfile>> {
    conn.query_row(
        &format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE user_id = ?1"),
        params![user_id.0],
        profile_from_row,
    )
    .optional()
}

fn write_profile(conn: &Connection, p: &SubscriberProfile) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO profiles (user_id, keywords, excluded_keywords, technologies, regions, \
         budget_min, budget_max, project_types, experience_levels, payment_types, \
         notification_mode, digest_hour, digest_minute, subscribed, last_digest_on, \
         created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17) \
         ON CONFLICT (user_id) DO UPDATE SET \
           keywords = excluded.keywords, \
           excluded_keywords = excluded.excluded_keywords, \
           technologies = excluded.technologies, \
           regions = excluded.regions, \
           budget_min = excluded.budget_min, \
           budget_max = excluded.budget_max, \
           project_types = excluded.project_types, \
           experience_levels = excluded.experience_levels, \
           payment_types = excluded.payment_types, \
           notification_mode = excluded.notification_mode, \
           digest_hour = excluded.digest_hour, \
           digest_minute = excluded.digest_minute, \
           subscribed = excluded.subscribed, \
           last_digest_on = excluded.last_digest_on, \
           updated_at = excluded.updated_at",
        params![
            p.user_id.0,
            encode_json(&p.keywords)?,
            encode_json(&p.excluded_keywords)?,
            encode_json(&p.technologies)?,
            encode_json(&p.regions)?,
            p.budget_min,
            p.budget_max,
            encode_json(&p.project_types)?,
            encode_json(&p.experience_levels)?,
            encode_json(&p.payment_types)?,
            p.notification_mode.to_string(),
            p.digest_hour,
            p.digest_minute,
            p.subscribed,
            p.last_digest_on.map(|d| d.format("%Y-%m-%d").to_string()),
            encode_ts(&p.created_at),
            encode_ts(&p.updated_at),
        ],
    )?;
    Ok(())
}

pub async fn get_profile(
    db: &Database,
    user_id: UserId,
) -> Result<Option<SubscriberProfile>, FrilansError> {
    db.connection()
        .call(move |conn| -> Result<Option<SubscriberProfile>, rusqlite::Error> {
            select_profile(conn, user_id)
        })
        .await
        .map_err(map_tr_err)
}

/// All subscribed profiles, ordered by user id.
pub async fn get_active_profiles(db: &Database) -> Result<Vec<SubscriberProfile>, FrilansError> {
    db.connection()
        .call(|conn| -> Result<Vec<SubscriberProfile>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {PROFILE_COLUMNS} FROM profiles WHERE subscribed = 1 ORDER BY user_id"
            ))?;
            let rows = stmt.query_map([], profile_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Apply one mutation inside a transaction, creating the profile if needed.
///
/// A successful mutation commits together with a `profile_updated` audit
/// entry. Validation failures roll back and surface as
/// [`FrilansError::InvalidProfileMutation`] with stored state unchanged.
pub async fn apply_mutation(
    db: &Database,
    user_id: UserId,
    mutation: ProfileMutation,
    defaults: DigestDefault,
) -> Result<SubscriberProfile, FrilansError> {
    let outcome = db
        .connection()
        .call(
            move |conn| -> Result<Result<SubscriberProfile, FrilansError>, rusqlite::Error> {
                let tx = conn.transaction()?;
                let now = Utc::now().trunc_subsecs(3);
                let existing = select_profile(&tx, user_id)?;
                let created = existing.is_none();
                let mut profile = existing.unwrap_or_else(|| {
                    SubscriberProfile::new(user_id, defaults.hour, defaults.minute, now)
                });
                let details = json!({
                    "mutation": mutation.name(),
                    "change": serde_json::to_value(&mutation).unwrap_or(Value::Null),
                    "created": created,
                });
                if let Err(e) = profile.apply(mutation, now) {
                    return Ok(Err(e));
                }
                write_profile(&tx, &profile)?;
                audit::insert_event(
                    &tx,
                    &AuditEvent {
                        kind: AuditKind::ProfileUpdated,
                        user_id: Some(user_id),
                        details,
                        recorded_at: now,
                    },
                )?;
                tx.commit()?;
                Ok(Ok(profile))
            },
        )
        .await
        .map_err(map_tr_err)?;
    outcome
}

pub async fn mark_digest_sent(
    db: &Database,
    user_id: UserId,
    on: NaiveDate,
) -> Result<(), FrilansError> {
    let on = on.format("%Y-%m-%d").to_string();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "UPDATE profiles SET last_digest_on = ?1 WHERE user_id = ?2",
                params![on, user_id.0],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// `(total, subscribed)` profile counts.
pub async fn count_profiles(db: &Database) -> Result<(u64, u64), FrilansError> {
    db.connection()
        .call(|conn| -> Result<(u64, u64), rusqlite::Error> {
            conn.query_row(
                "SELECT COUNT(*), COALESCE(SUM(subscribed), 0) FROM profiles",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use frilans_core::types::{NotificationMode, PaymentType};
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn first_mutation_creates_profile_with_defaults() {
        let (db, _dir) = setup_db().await;
        let defaults = DigestDefault { hour: 8, minute: 15 };
        let profile = apply_mutation(&db, UserId(5), ProfileMutation::Subscribe, defaults)
            .await
            .unwrap();
        assert!(profile.subscribed);
        assert_eq!((profile.digest_hour, profile.digest_minute), (8, 15));

        let stored = get_profile(&db, UserId(5)).await.unwrap().unwrap();
        assert_eq!(stored, profile);
    }

    #[tokio::test]
    async fn rejected_mutation_leaves_row_untouched() {
        let (db, _dir) = setup_db().await;
        let d = DigestDefault::default();
        apply_mutation(&db, UserId(1), ProfileMutation::AddKeywords(vec!["rust".into()]), d)
            .await
            .unwrap();

        let err = apply_mutation(
            &db,
            UserId(1),
            ProfileMutation::SetDigestTime { hour: 30, minute: 0 },
            d,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, FrilansError::InvalidProfileMutation(_)));

        let stored = get_profile(&db, UserId(1)).await.unwrap().unwrap();
        assert_eq!(stored.digest_hour, 10);
        assert!(stored.keywords.contains("rust"));
    }

    #[tokio::test]
    async fn rejected_first_mutation_creates_nothing() {
        let (db, _dir) = setup_db().await;
        let result = apply_mutation(
            &db,
            UserId(3),
            ProfileMutation::AddKeywords(vec![" ".into()]),
            DigestDefault::default(),
        )
        .await;
        assert!(result.is_err());
        assert!(get_profile(&db, UserId(3)).await.unwrap().is_none());
        assert_eq!(audit::count_events(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn applied_mutations_are_audited() {
        let (db, _dir) = setup_db().await;
        let d = DigestDefault::default();
        apply_mutation(&db, UserId(6), ProfileMutation::Subscribe, d)
            .await
            .unwrap();
        apply_mutation(
            &db,
            UserId(6),
            ProfileMutation::SetNotificationMode(NotificationMode::DailyDigest),
            d,
        )
        .await
        .unwrap();

        let events = audit::recent(&db, 10).await.unwrap();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.kind == AuditKind::ProfileUpdated));
        assert!(events.iter().all(|e| e.user_id == Some(UserId(6))));
        assert_eq!(events[0].details["mutation"], "set_notification_mode");
        assert_eq!(events[0].details["created"], false);
        assert_eq!(events[1].details["mutation"], "subscribe");
        assert_eq!(events[1].details["created"], true);
    }

    #[tokio::test]
    async fn only_subscribed_profiles_are_active() {
        let (db, _dir) = setup_db().await;
        let d = DigestDefault::default();
        apply_mutation(&db, UserId(1), ProfileMutation::Subscribe, d)
            .await
            .unwrap();
        apply_mutation(&db, UserId(2), ProfileMutation::Subscribe, d)
            .await
            .unwrap();
        apply_mutation(&db, UserId(2), ProfileMutation::Unsubscribe, d)
            .await
            .unwrap();
        apply_mutation(&db, UserId(3), ProfileMutation::AddKeywords(vec!["go".into()]), d)
            .await
            .unwrap();

        let active = get_active_profiles(&db).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].user_id, UserId(1));
        assert_eq!(count_profiles(&db).await.unwrap(), (3, 1));
    }

    #[tokio::test]
    async fn set_fields_survive_storage() {
        let (db, _dir) = setup_db().await;
        let d = DigestDefault::default();
        apply_mutation(
            &db,
            UserId(9),
            ProfileMutation::SetPaymentTypes(vec![PaymentType::Escrow]),
            d,
        )
        .await
        .unwrap();
        apply_mutation(
            &db,
            UserId(9),
            ProfileMutation::SetNotificationMode(NotificationMode::DailyDigest),
            d,
        )
        .await
        .unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        mark_digest_sent(&db, UserId(9), date).await.unwrap();

        let stored = get_profile(&db, UserId(9)).await.unwrap().unwrap();
        assert!(stored.payment_types.contains(&PaymentType::Escrow));
        assert_eq!(stored.notification_mode, NotificationMode::DailyDigest);
        assert_eq!(stored.last_digest_on, Some(date));
    }
}
