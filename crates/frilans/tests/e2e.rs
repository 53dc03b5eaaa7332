// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the complete Frilans pipeline.
//!
//! Each test creates an isolated TestHarness with temp SQLite, scripted
//! fetchers, and a recording sender. Tests are independent and
//! order-insensitive.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use frilans_collector::SourceStatus;
use frilans_core::types::{NotificationMode, RawListing, SourceKind, UserId};
use frilans_core::{ListingStore, ProfileMutation, SourceFetcher};
use frilans_pipeline::Pipeline;
use frilans_test_utils::{Script, ScriptedFetcher, TestHarness};
use tracing_test::traced_test;

fn pipeline(h: &TestHarness, fetchers: Vec<Arc<dyn SourceFetcher>>) -> Pipeline {
    Pipeline::new(fetchers, h.store(), h.sender.clone(), h.config.clone())
}

fn listing(id: &str, title: &str) -> RawListing {
    RawListing::new(id, title)
}

// ---- Idempotence ----

#[tokio::test]
async fn identical_second_cycle_finds_and_sends_nothing() {
    let h = TestHarness::builder().build().await.unwrap();
    h.subscriber(1, vec![]).await.unwrap();
    let fetcher: Arc<dyn SourceFetcher> = Arc::new(ScriptedFetcher::always(
        SourceKind::FlRu,
        vec![listing("100", "Telegram bot"), listing("101", "Landing page")],
    ));
    let p = pipeline(&h, vec![fetcher]);

    let first = p.run_cycle().await.unwrap();
    assert_eq!(first.cycle.new_listings.len(), 2);
    assert_eq!(h.sender.sent_count().await, 1);

    let second = p.run_cycle().await.unwrap();
    assert!(second.cycle.new_listings.is_empty());
    assert_eq!(second.dispatch.messages_sent, 0);
    assert_eq!(h.sender.sent_count().await, 1);
    assert_eq!(h.store.stats().await.unwrap().listings, 2);
}

// ---- Dedup across sources and within a cycle ----

#[tokio::test]
async fn same_id_from_two_sources_is_two_listings() {
    let h = TestHarness::builder().build().await.unwrap();
    let a: Arc<dyn SourceFetcher> = Arc::new(ScriptedFetcher::always(
        SourceKind::FlRu,
        vec![listing("7", "Parser"), listing("7", "Parser (repost)")],
    ));
    let b: Arc<dyn SourceFetcher> = Arc::new(ScriptedFetcher::always(
        SourceKind::Weblancer,
        vec![listing("7", "Parser")],
    ));

    let outcome = pipeline(&h, vec![a, b]).run_cycle().await.unwrap();
    assert_eq!(outcome.cycle.duplicates_in_cycle, 1);
    assert_eq!(outcome.cycle.new_listings.len(), 2);
}

// ---- Degraded source scenario ----

#[tokio::test(start_paused = true)]
#[traced_test]
async fn timed_out_source_is_degraded_and_retried_next_cycle() {
    let h = TestHarness::builder().build().await.unwrap();
    h.subscriber(1, vec![]).await.unwrap();

    let a = Arc::new(ScriptedFetcher::always(
        SourceKind::Github,
        vec![listing("x", "Listing X")],
    ));
    let b = Arc::new(ScriptedFetcher::new(
        SourceKind::Freemarket,
        vec![
            Script::Hang,
            Script::Hang,
            Script::Unavailable("503 from upstream".into()),
            Script::Listings(vec![listing("z", "Listing Z")]),
        ],
    ));
    let p = pipeline(&h, vec![a.clone() as Arc<dyn SourceFetcher>, b.clone()]);

    let first = p.run_cycle().await.unwrap();
    assert_eq!(first.cycle.new_listings.len(), 1);
    assert_eq!(first.cycle.new_listings[0].listing.source_id, "x");
    assert_eq!(first.cycle.sources[1].status, SourceStatus::Degraded);
    assert!(logs_contain("source degraded"));
    assert_eq!(h.sender.sent_to(UserId(1)).await.len(), 1);

    let second = p.run_cycle().await.unwrap();
    assert_eq!(b.calls(), 4);
    assert_eq!(second.cycle.new_listings.len(), 1);
    assert_eq!(second.cycle.new_listings[0].listing.source_id, "z");
}

// ---- Digest batching ----

#[tokio::test]
async fn seven_digest_matches_arrive_as_two_messages_at_send_time() {
    let h = TestHarness::builder().build().await.unwrap();
    h.subscriber(
        9,
        vec![
            ProfileMutation::SetNotificationMode(NotificationMode::DailyDigest),
            ProfileMutation::SetDigestTime { hour: 8, minute: 30 },
        ],
    )
    .await
    .unwrap();
    let fetcher: Arc<dyn SourceFetcher> = Arc::new(ScriptedFetcher::always(
        SourceKind::FlRu,
        (1..=7).map(|i| listing(&i.to_string(), &format!("Job {i}"))).collect(),
    ));
    let p = pipeline(&h, vec![fetcher]);
    p.run_cycle().await.unwrap();

    let early = Utc.with_ymd_and_hms(2026, 7, 1, 8, 29, 0).unwrap();
    p.run_digest(early).await;
    assert_eq!(h.sender.sent_count().await, 0);

    let on_time = Utc.with_ymd_and_hms(2026, 7, 1, 8, 30, 0).unwrap();
    p.run_digest(on_time).await;
    let sent = h.sender.sent_to(UserId(9)).await;
    assert_eq!(sent.len(), 2);

    let refs: Vec<_> = sent.iter().flat_map(|m| m.listing_refs.clone()).collect();
    assert_eq!(refs.len(), 7);
    assert_eq!(refs.iter().collect::<HashSet<_>>().len(), 7);

    p.run_digest(on_time).await;
    assert_eq!(h.sender.sent_count().await, 2);
}

// ---- At-most-once delivery ----

#[tokio::test]
async fn switching_modes_never_redelivers() {
    let h = TestHarness::builder().build().await.unwrap();
    h.subscriber(3, vec![]).await.unwrap();
    let fetcher: Arc<dyn SourceFetcher> = Arc::new(ScriptedFetcher::always(
        SourceKind::Telegram,
        vec![listing("m1", "Mobile app")],
    ));
    let p = pipeline(&h, vec![fetcher]);
    let outcome = p.run_cycle().await.unwrap();
    let id = outcome.cycle.new_listings[0].id;

    // The same listing ends up queued for a digest after the user switches modes.
    h.store
        .apply_profile_mutation(
            UserId(3),
            ProfileMutation::SetNotificationMode(NotificationMode::DailyDigest),
        )
        .await
        .unwrap();
    h.store.enqueue_digest(UserId(3), &[id]).await.unwrap();
    let evening = Utc.with_ymd_and_hms(2026, 7, 1, 23, 0, 0).unwrap();
    let report = p.run_digest(evening).await;

    assert_eq!(report.delivery.already_delivered, 1);
    assert_eq!(h.sender.sent_count().await, 1);
    assert!(!h.store.record_delivery(UserId(3), id, "test").await.unwrap());
}

// ---- Failure isolation ----

#[tokio::test]
#[traced_test]
async fn failing_subscriber_does_not_block_others() {
    let h = TestHarness::builder().build().await.unwrap();
    for user in [1, 2, 3] {
        h.subscriber(user, vec![]).await.unwrap();
    }
    h.sender.fail_user(UserId(2)).await;
    let fetcher: Arc<dyn SourceFetcher> = Arc::new(ScriptedFetcher::always(
        SourceKind::Github,
        vec![listing("i1", "Fix flaky CI")],
    ));

    let outcome = pipeline(&h, vec![fetcher]).run_cycle().await.unwrap();
    assert_eq!(outcome.dispatch.messages_sent, 2);
    assert_eq!(outcome.dispatch.failed_messages, 1);
    assert_eq!(h.sender.sent_to(UserId(1)).await.len(), 1);
    assert_eq!(h.sender.sent_to(UserId(3)).await.len(), 1);
    assert!(logs_contain("delivery permanently failed"));

    let failures = h.store.recent_failed_deliveries(10).await.unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].user_id, UserId(2));
}

#[tokio::test]
async fn excluded_keyword_suppresses_delivery() {
    let h = TestHarness::builder().build().await.unwrap();
    h.subscriber(
        4,
        vec![
            ProfileMutation::AddKeywords(vec!["python".into()]),
            ProfileMutation::AddExcludedKeywords(vec!["wordpress".into()]),
        ],
    )
    .await
    .unwrap();
    let mut wp = listing("w1", "Python script for WordPress export");
    wp.description = Some("Migrate posts".into());
    let fetcher: Arc<dyn SourceFetcher> = Arc::new(ScriptedFetcher::always(
        SourceKind::Weblancer,
        vec![wp, listing("w2", "Python data pipeline")],
    ));

    pipeline(&h, vec![fetcher]).run_cycle().await.unwrap();
    let sent = h.sender.sent_to(UserId(4)).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].listing_refs.len(), 1);
    assert!(sent[0].text.contains("Python data pipeline"));
}
