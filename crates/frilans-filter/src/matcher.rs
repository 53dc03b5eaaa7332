// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-cycle recipient matching.

use std::collections::BTreeMap;

use frilans_core::types::{StoredListing, SubscriberProfile, UserId};
use tracing::{debug, trace};

use crate::predicate::CompiledProfile;

/// Matches for one cycle, keyed by subscriber. Each list keeps the cycle's
/// emission order.
pub type CycleMatches = BTreeMap<UserId, Vec<StoredListing>>;

/// Match every newly persisted listing against every subscribed profile.
///
/// Subscribers with no matches are absent from the result.
pub fn match_cycle(listings: &[StoredListing], profiles: &[SubscriberProfile]) -> CycleMatches {
    let compiled: Vec<CompiledProfile<'_>> = profiles
        .iter()
        .filter(|p| p.subscribed)
        .map(CompiledProfile::new)
        .collect();

    let mut out = CycleMatches::new();
    for stored in listings {
        for profile in &compiled {
            match profile.evaluate(&stored.listing) {
                Ok(()) => out
                    .entry(profile.profile.user_id)
                    .or_default()
                    .push(stored.clone()),
                Err(reason) => trace!(
                    user_id = %profile.profile.user_id,
                    listing_id = %stored.id,
                    %reason,
                    "listing rejected"
                ),
            }
        }
    }

    debug!(
        listings = listings.len(),
        profiles = compiled.len(),
        recipients = out.len(),
        "cycle matched"
    );
    out
}
