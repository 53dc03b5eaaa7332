// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Multi-cycle collector scenarios against a real store.

use std::sync::Arc;

use frilans_collector::{Collector, SourceStatus};
use frilans_core::types::{RawListing, SourceKind};
use frilans_core::{ListingStore, SourceFetcher};
use frilans_test_utils::{Script, ScriptedFetcher, TestHarness};

#[tokio::test(start_paused = true)]
async fn flaky_source_degrades_then_recovers_next_cycle() {
    let h = TestHarness::builder().build().await.unwrap();

    let a = Arc::new(ScriptedFetcher::always(
        SourceKind::FlRu,
        vec![RawListing::new("x", "Listing X")],
    ));
    let b = Arc::new(ScriptedFetcher::new(
        SourceKind::Weblancer,
        vec![
            Script::Hang,
            Script::Hang,
            Script::Unavailable("connection reset".into()),
            Script::Listings(vec![RawListing::new("y", "Listing Y")]),
        ],
    ));
    let fetchers: Vec<Arc<dyn SourceFetcher>> = vec![a.clone(), b.clone()];
    let collector = Collector::new(fetchers, h.store(), &h.config.collector);

    let first = collector.run_cycle().await.unwrap();
    assert_eq!(first.new_listings.len(), 1);
    assert_eq!(first.new_listings[0].listing.source_id, "x");
    let b_report = &first.sources[1];
    assert_eq!(b_report.status, SourceStatus::Degraded);
    assert_eq!(b_report.attempts, 3);
    assert_eq!(b.calls(), 3);

    let second = collector.run_cycle().await.unwrap();
    assert_eq!(second.new_listings.len(), 1);
    assert_eq!(second.new_listings[0].listing.source_id, "y");
    assert!(second.degraded_sources().next().is_none());
    assert_eq!(a.calls(), 2);

    assert_eq!(h.store.stats().await.unwrap().listings, 2);
}

#[tokio::test]
async fn listings_seen_in_earlier_cycles_are_not_re_emitted() {
    let h = TestHarness::builder().build().await.unwrap();
    let fetcher = Arc::new(ScriptedFetcher::new(
        SourceKind::Github,
        vec![
            Script::Listings(vec![RawListing::new("1", "One")]),
            Script::Listings(vec![RawListing::new("1", "One, edited"), RawListing::new("2", "Two")]),
        ],
    ));
    let fetchers: Vec<Arc<dyn SourceFetcher>> = vec![fetcher];
    let collector = Collector::new(fetchers, h.store(), &h.config.collector);

    collector.run_cycle().await.unwrap();
    let second = collector.run_cycle().await.unwrap();
    assert_eq!(second.new_listings.len(), 1);
    assert_eq!(second.new_listings[0].listing.source_id, "2");

    // First-seen record stays authoritative.
    let stored = h
        .store
        .get_listing(frilans_core::types::ListingId(1))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.listing.title, "One");
}
