// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The listing/profile predicate.
//!
//! Checks run in a fixed order and stop at the first failure:
//! exclusion, keywords, technology, region, budget, project type,
//! experience level, payment type. Every axis with an empty profile set
//! passes, and `unspecified` listing values pass every enum axis.

use std::collections::BTreeSet;

use frilans_core::types::{
    ExperienceLevel, Listing, PaymentType, ProjectType, SubscriberProfile,
};

/// The first check a listing failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum RejectReason {
    ExcludedKeyword,
    NoKeyword,
    Technology,
    Region,
    Budget,
    ProjectType,
    ExperienceLevel,
    PaymentType,
}

/// A profile prepared for repeated evaluation.
///
/// Holds lowercased term lists so matching a whole cycle does not redo the
/// normalization for every listing.
#[derive(Debug, Clone)]
pub struct CompiledProfile<'a> {
    pub profile: &'a SubscriberProfile,
    keywords: Vec<String>,
    excluded: Vec<String>,
}

impl<'a> CompiledProfile<'a> {
    pub fn new(profile: &'a SubscriberProfile) -> Self {
        Self {
            profile,
            keywords: lowered(&profile.keywords),
            excluded: lowered(&profile.excluded_keywords),
        }
    }

    pub fn evaluate(&self, listing: &Listing) -> Result<(), RejectReason> {
        let p = self.profile;
        let haystack = format!("{}\n{}", listing.title, listing.description).to_lowercase();

        if self.excluded.iter().any(|t| haystack.contains(t.as_str())) {
            return Err(RejectReason::ExcludedKeyword);
        }
        if !self.keywords.is_empty() && !self.keywords.iter().any(|t| haystack.contains(t.as_str()))
        {
            return Err(RejectReason::NoKeyword);
        }
        if !intersects_ci(&p.technologies, &listing.technologies) {
            return Err(RejectReason::Technology);
        }
        if !listing.regions.is_empty() && !intersects_ci(&p.regions, &listing.regions) {
            return Err(RejectReason::Region);
        }
        if !budget_overlaps(listing, p) {
            return Err(RejectReason::Budget);
        }
        if !p.project_types.is_empty()
            && listing.project_type != ProjectType::Unspecified
            && !p.project_types.contains(&listing.project_type)
        {
            return Err(RejectReason::ProjectType);
        }
        if !p.experience_levels.is_empty()
            && listing.experience_level != ExperienceLevel::Unspecified
            && !p.experience_levels.contains(&listing.experience_level)
        {
            return Err(RejectReason::ExperienceLevel);
        }
        if !p.payment_types.is_empty()
            && listing.payment_type != PaymentType::Unspecified
            && !p.payment_types.contains(&listing.payment_type)
        {
            return Err(RejectReason::PaymentType);
        }
        Ok(())
    }
}

/// Evaluate one listing against one profile.
pub fn evaluate(listing: &Listing, profile: &SubscriberProfile) -> Result<(), RejectReason> {
    CompiledProfile::new(profile).evaluate(listing)
}

pub fn matches(listing: &Listing, profile: &SubscriberProfile) -> bool {
    evaluate(listing, profile).is_ok()
}

fn lowered(terms: &BTreeSet<String>) -> Vec<String> {
    terms
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Empty `wanted` passes; otherwise at least one shared term, ignoring case.
fn intersects_ci(wanted: &BTreeSet<String>, have: &BTreeSet<String>) -> bool {
    if wanted.is_empty() {
        return true;
    }
    have.iter().any(|h| {
        let h = h.to_lowercase();
        wanted.iter().any(|w| w.to_lowercase() == h)
    })
}

/// Closed-interval overlap with missing bounds treated as unbounded.
fn budget_overlaps(listing: &Listing, profile: &SubscriberProfile) -> bool {
    if !listing.has_budget() {
        return true;
    }
    let lmin = listing.budget_min.unwrap_or(f64::NEG_INFINITY);
    let lmax = listing.budget_max.unwrap_or(f64::INFINITY);
    let pmin = profile.budget_min.unwrap_or(f64::NEG_INFINITY);
    let pmax = profile.budget_max.unwrap_or(f64::INFINITY);
    lmin <= pmax && pmin <= lmax
}
