// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retention purge and aggregate counts.

use chrono::{DateTime, Utc};
use frilans_core::FrilansError;
use frilans_core::types::{PurgeReport, StoreStats};
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::queries::{audit, deliveries, digests, listings, profiles};
use crate::rows::encode_ts;

/// Delete everything older than `cutoff` in one transaction.
///
/// Listings still referenced by a pending digest are kept until the digest
/// drains them; the count is reported as `listings_retained`.
pub async fn purge_older_than(
    db: &Database,
    cutoff: DateTime<Utc>,
) -> Result<PurgeReport, FrilansError> {
    let cutoff = encode_ts(&cutoff);
    db.connection()
        .call(move |conn| -> Result<PurgeReport, rusqlite::Error> {
            let tx = conn.transaction()?;
            let listings_retained: u64 = tx.query_row(
                "SELECT COUNT(*) FROM listings WHERE fetched_at < ?1 \
                 AND id IN (SELECT listing_id FROM pending_digest)",
                params![cutoff],
                |r| r.get(0),
            )?;
            let deliveries_removed = tx.execute(
                "DELETE FROM deliveries WHERE delivered_at < ?1",
                params![cutoff],
            )?;
            let listings_removed = tx.execute(
                "DELETE FROM listings WHERE fetched_at < ?1 \
                 AND id NOT IN (SELECT listing_id FROM pending_digest)",
                params![cutoff],
            )?;
            let failures_removed = tx.execute(
                "DELETE FROM delivery_failures WHERE failed_at < ?1",
                params![cutoff],
            )?;
            let audit_events_removed = tx.execute(
                "DELETE FROM audit_events WHERE recorded_at < ?1",
                params![cutoff],
            )?;
            tx.commit()?;
            Ok(PurgeReport {
                listings_removed: listings_removed as u64,
                deliveries_removed: deliveries_removed as u64,
                failures_removed: failures_removed as u64,
                audit_events_removed: audit_events_removed as u64,
                listings_retained,
            })
        })
        .await
        .map_err(map_tr_err)
}

pub async fn stats(db: &Database) -> Result<StoreStats, FrilansError> {
    let listings = listings::count_listings(db).await?;
    let (profiles, subscribed) = profiles::count_profiles(db).await?;
    let (deliveries, failed_deliveries) = deliveries::count_deliveries(db).await?;
    let pending_digest = digests::count_pending(db).await?;
    let audit_events = audit::count_events(db).await?;
    Ok(StoreStats {
        listings,
        profiles,
        subscribed,
        deliveries,
        pending_digest,
        failed_deliveries,
        audit_events,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use chrono::Duration;
    use frilans_core::types::{
        ExperienceLevel, Listing, ListingId, PaymentType, ProjectType, SourceKind, UserId,
    };
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn listing_fetched(source_id: &str, fetched_at: DateTime<Utc>) -> Listing {
        Listing {
            source: SourceKind::Weblancer,
            source_id: source_id.into(),
            title: "Landing page".into(),
            description: String::new(),
            url: String::new(),
            budget_min: None,
            budget_max: None,
            currency: None,
            regions: BTreeSet::new(),
            technologies: BTreeSet::new(),
            project_type: ProjectType::Unspecified,
            experience_level: ExperienceLevel::Unspecified,
            payment_type: PaymentType::Unspecified,
            posted_at: None,
            fetched_at,
        }
    }

    async fn seed(db: &Database) -> (ListingId, ListingId, ListingId) {
        let old = Utc::now() - Duration::days(40);
        let stored = listings::persist_cycle(
            db,
            vec![
                listing_fetched("old-1", old),
                listing_fetched("old-2", old),
                listing_fetched("fresh", Utc::now()),
            ],
        )
        .await
        .unwrap();
        (stored[0].id, stored[1].id, stored[2].id)
    }

    #[tokio::test]
    async fn purge_removes_old_listings_only() {
        let (db, _dir) = setup_db().await;
        let (_, _, fresh) = seed(&db).await;

        let report = purge_older_than(&db, Utc::now() - Duration::days(30))
            .await
            .unwrap();
        assert_eq!(report.listings_removed, 2);
        assert_eq!(report.listings_retained, 0);
        assert!(listings::get_listing(&db, fresh).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn pending_digest_listing_survives_purge() {
        let (db, _dir) = setup_db().await;
        let (old_1, old_2, _) = seed(&db).await;
        digests::enqueue(&db, UserId(1), &[old_1]).await.unwrap();

        let report = purge_older_than(&db, Utc::now() - Duration::days(30))
            .await
            .unwrap();
        assert_eq!(report.listings_removed, 1);
        assert_eq!(report.listings_retained, 1);
        assert!(listings::get_listing(&db, old_1).await.unwrap().is_some());
        assert!(listings::get_listing(&db, old_2).await.unwrap().is_none());
        assert_eq!(digests::pending(&db, UserId(1)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn stats_reflect_every_table() {
        let (db, _dir) = setup_db().await;
        let (old_1, _, fresh) = seed(&db).await;
        profiles::apply_mutation(
            &db,
            UserId(1),
            frilans_core::ProfileMutation::Subscribe,
            profiles::DigestDefault::default(),
        )
        .await
        .unwrap();
        deliveries::record_delivery(&db, UserId(1), fresh, "telegram")
            .await
            .unwrap();
        digests::enqueue(&db, UserId(1), &[old_1]).await.unwrap();

        let stats = stats(&db).await.unwrap();
        assert_eq!(stats.listings, 3);
        assert_eq!((stats.profiles, stats.subscribed), (1, 1));
        assert_eq!(stats.deliveries, 1);
        assert_eq!(stats.pending_digest, 1);
        assert_eq!(stats.failed_deliveries, 0);
        assert_eq!(stats.audit_events, 1);
    }

    #[tokio::test]
    async fn purge_drops_old_audit_entries() {
        let (db, _dir) = setup_db().await;
        let mut old = frilans_core::types::AuditEvent::new(
            frilans_core::types::AuditKind::CycleFailed,
            None,
            serde_json::json!({}),
        );
        old.recorded_at = Utc::now() - Duration::days(45);
        audit::record(&db, &old).await.unwrap();
        profiles::apply_mutation(
            &db,
            UserId(2),
            frilans_core::ProfileMutation::Subscribe,
            profiles::DigestDefault::default(),
        )
        .await
        .unwrap();

        let report = purge_older_than(&db, Utc::now() - Duration::days(30))
            .await
            .unwrap();
        assert_eq!(report.audit_events_removed, 1);
        assert_eq!(audit::count_events(&db).await.unwrap(), 1);
    }
}
