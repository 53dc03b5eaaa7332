// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the SQLite listing store through its trait surface.

use std::collections::{BTreeSet, HashSet};

use chrono::{Duration, Utc};
use proptest::prelude::*;

use frilans_config::model::StorageConfig;
use frilans_core::types::{
    AuditKind, ExperienceLevel, FailedDelivery, Listing, PaymentType, ProjectType, SourceKind, UserId,
};
use frilans_core::{ListingStore, ProfileMutation};
use frilans_storage::SqliteStore;

fn listing(source: SourceKind, source_id: &str) -> Listing {
    Listing {
        source,
        source_id: source_id.into(),
        title: format!("Project {source_id}"),
        description: "Need a parser".into(),
        url: format!("https://example.test/{source_id}"),
        budget_min: Some(100.0),
        budget_max: None,
        currency: Some("USD".into()),
        regions: BTreeSet::new(),
        technologies: ["rust".to_string()].into(),
        project_type: ProjectType::Fixed,
        experience_level: ExperienceLevel::Unspecified,
        payment_type: PaymentType::Unspecified,
        posted_at: None,
        fetched_at: Utc::now(),
    }
}

async fn open_store(dir: &tempfile::TempDir) -> SqliteStore {
    let path = dir.path().join("frilans.db");
    let store = SqliteStore::new(StorageConfig {
        database_path: path.to_string_lossy().into_owned(),
        wal_mode: true,
    });
    store.initialize().await.unwrap();
    store
}

#[tokio::test]
async fn listings_survive_reopen_and_stay_deduplicated() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = open_store(&dir).await;
        let new = store
            .persist_cycle(vec![
                listing(SourceKind::FlRu, "1"),
                listing(SourceKind::Github, "1"),
            ])
            .await
            .unwrap();
        assert_eq!(new.len(), 2);
        store.close().await.unwrap();
    }

    let store = open_store(&dir).await;
    assert!(
        !store
            .upsert_if_absent(&listing(SourceKind::FlRu, "1"))
            .await
            .unwrap()
    );
    assert!(
        store
            .upsert_if_absent(&listing(SourceKind::FlRu, "2"))
            .await
            .unwrap()
    );
    assert_eq!(store.stats().await.unwrap().listings, 3);
}

#[tokio::test]
async fn digest_flow_through_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir).await;
    store
        .apply_profile_mutation(UserId(42), ProfileMutation::Subscribe)
        .await
        .unwrap();

    let stored = store
        .persist_cycle(vec![
            listing(SourceKind::Weblancer, "a"),
            listing(SourceKind::Weblancer, "b"),
        ])
        .await
        .unwrap();
    let ids: Vec<_> = stored.iter().map(|s| s.id).collect();
    assert_eq!(store.enqueue_digest(UserId(42), &ids).await.unwrap(), 2);

    let pending = store.pending_digest(UserId(42)).await.unwrap();
    assert_eq!(pending.len(), 2);
    assert_eq!(pending[0].listing.source_id, "a");

    for id in &ids {
        assert!(store.record_delivery(UserId(42), *id, "telegram").await.unwrap());
    }
    store.remove_from_digest(UserId(42), &ids).await.unwrap();
    let today = Utc::now().date_naive();
    store.mark_digest_sent(UserId(42), today).await.unwrap();

    assert!(store.pending_digest(UserId(42)).await.unwrap().is_empty());
    let profile = store.get_profile(UserId(42)).await.unwrap().unwrap();
    assert_eq!(profile.last_digest_on, Some(today));
}

#[tokio::test]
async fn audit_trail_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = open_store(&dir).await;
        store
            .apply_profile_mutation(UserId(12), ProfileMutation::AddKeywords(vec!["go".into()]))
            .await
            .unwrap();
        store
            .record_failed_delivery(&FailedDelivery {
                user_id: UserId(12),
                listing_ids: vec![],
                error: "bot was blocked by the user".into(),
                attempts: 3,
                failed_at: Utc::now(),
            })
            .await
            .unwrap();
        store.close().await.unwrap();
    }

    let store = open_store(&dir).await;
    let events = store.recent_audit_events(10).await.unwrap();
    let kinds: Vec<_> = events.iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![AuditKind::DeliveryFailed, AuditKind::ProfileUpdated]);
    assert_eq!(store.stats().await.unwrap().audit_events, 2);
}

#[tokio::test]
async fn purge_cascades_to_delivery_rows() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir).await;
    let mut old = listing(SourceKind::Freemarket, "old");
    old.fetched_at = Utc::now() - Duration::days(90);
    let stored = store.persist_cycle(vec![old]).await.unwrap();
    store
        .record_delivery(UserId(1), stored[0].id, "telegram")
        .await
        .unwrap();

    let report = store
        .purge_older_than(Utc::now() - Duration::days(30))
        .await
        .unwrap();
    assert_eq!(report.listings_removed, 1);
    let stats = store.stats().await.unwrap();
    assert_eq!(stats.listings, 0);
    assert_eq!(stats.deliveries, 0);

    // A purged listing is new again if a source returns it.
    let mut again = listing(SourceKind::Freemarket, "old");
    again.fetched_at = Utc::now();
    assert_eq!(store.persist_cycle(vec![again]).await.unwrap().len(), 1);
}

fn arb_key() -> impl Strategy<Value = (SourceKind, String)> {
    (
        prop_oneof![
            Just(SourceKind::FlRu),
            Just(SourceKind::Weblancer),
            Just(SourceKind::Github),
        ],
        "[a-c][0-9]",
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn repeated_cycles_never_duplicate(
        first in prop::collection::vec(arb_key(), 0..12),
        second in prop::collection::vec(arb_key(), 0..12),
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let store = open_store(&dir).await;

            let mut seen = HashSet::new();
            for batch in [&first, &second] {
                let listings: Vec<_> = batch
                    .iter()
                    .map(|(source, id)| listing(*source, id))
                    .collect();
                let expected: Vec<_> = batch
                    .iter()
                    .filter(|key| seen.insert((*key).clone()))
                    .cloned()
                    .collect();
                let inserted: Vec<_> = store
                    .persist_cycle(listings)
                    .await
                    .unwrap()
                    .into_iter()
                    .map(|s| (s.listing.source, s.listing.source_id))
                    .collect();
                assert_eq!(inserted, expected);
            }
            assert_eq!(store.stats().await.unwrap().listings, seen.len() as u64);
        });
    }
}
