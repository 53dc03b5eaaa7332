// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the Frilans workspace.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// External source a listing was collected from.
///
/// The tag travels with every listing and forms half of its dedup key.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SourceKind {
    /// fl.ru freelance marketplace.
    FlRu,
    /// weblancer.net freelance marketplace.
    Weblancer,
    /// freemarket freelance marketplace.
    Freemarket,
    /// Code-forge issue search (help-wanted and bounty labels).
    Github,
    /// Monitored job channels on a messaging network.
    Telegram,
}

/// Globally unique identity of a listing: `(source, source-native id)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceKey {
    pub source: SourceKind,
    pub source_id: String,
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.source_id)
    }
}

/// Store-assigned identifier of a persisted listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(pub i64);

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Subscriber identifier (the chat id on the messaging transport).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier the transport assigned to a delivered message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ProjectType {
    Fixed,
    Hourly,
    #[default]
    Unspecified,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ExperienceLevel {
    Junior,
    #[strum(to_string = "mid", serialize = "middle")]
    Mid,
    Senior,
    #[default]
    Unspecified,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum PaymentType {
    Prepay,
    Postpay,
    Escrow,
    #[default]
    Unspecified,
}

/// How matches reach a subscriber.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum NotificationMode {
    /// Send as soon as the cycle that found the match completes.
    #[default]
    Instant,
    /// Accumulate and send once a day at the subscriber's digest time.
    DailyDigest,
}

/// A listing as a source fetcher reports it, before normalization.
///
/// Only `source_id` and `title` are mandatory; everything else may be
/// missing, free-form, or in a source-specific spelling.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawListing {
    pub source_id: String,
    pub title: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub budget_min: Option<f64>,
    pub budget_max: Option<f64>,
    /// Free-form budget such as "от 10 000 до 20 000 руб.", used when no numeric bounds are given.
    pub budget_text: Option<String>,
    pub currency: Option<String>,
    pub regions: Vec<String>,
    pub technologies: Vec<String>,
    pub project_type: Option<String>,
    pub experience_level: Option<String>,
    pub payment_type: Option<String>,
    /// Source-reported publication time in whatever format the source uses.
    pub posted_at: Option<String>,
}

impl RawListing {
    pub fn new(source_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Canonical, immutable form of a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub source: SourceKind,
    pub source_id: String,
    pub title: String,
    pub description: String,
    pub url: String,
    pub budget_min: Option<f64>,
    pub budget_max: Option<f64>,
    pub currency: Option<String>,
    /// Empty means the region is unknown.
    pub regions: BTreeSet<String>,
    pub technologies: BTreeSet<String>,
    pub project_type: ProjectType,
    pub experience_level: ExperienceLevel,
    pub payment_type: PaymentType,
    pub posted_at: Option<DateTime<Utc>>,
    pub fetched_at: DateTime<Utc>,
}

impl Listing {
    pub fn key(&self) -> SourceKey {
        SourceKey {
            source: self.source,
            source_id: self.source_id.clone(),
        }
    }

    pub fn has_budget(&self) -> bool {
        self.budget_min.is_some() || self.budget_max.is_some()
    }
}

/// A listing together with the id the store assigned it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredListing {
    pub id: ListingId,
    #[serde(flatten)]
    pub listing: Listing,
}

/// A subscriber's filter and delivery preferences.
///
/// Every set holds trimmed, lowercased terms. An empty set places no
/// constraint on its axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriberProfile {
    pub user_id: UserId,
    pub keywords: BTreeSet<String>,
    pub excluded_keywords: BTreeSet<String>,
    pub technologies: BTreeSet<String>,
    pub regions: BTreeSet<String>,
    pub budget_min: Option<f64>,
    pub budget_max: Option<f64>,
    pub project_types: BTreeSet<ProjectType>,
    pub experience_levels: BTreeSet<ExperienceLevel>,
    pub payment_types: BTreeSet<PaymentType>,
    pub notification_mode: NotificationMode,
    pub digest_hour: u8,
    pub digest_minute: u8,
    pub subscribed: bool,
    /// Local calendar date of the last digest sent to this subscriber.
    pub last_digest_on: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SubscriberProfile {
    /// A fresh, unsubscribed profile with no filters and the given digest time.
    pub fn new(user_id: UserId, digest_hour: u8, digest_minute: u8, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            keywords: BTreeSet::new(),
            excluded_keywords: BTreeSet::new(),
            technologies: BTreeSet::new(),
            regions: BTreeSet::new(),
            budget_min: None,
            budget_max: None,
            project_types: BTreeSet::new(),
            experience_levels: BTreeSet::new(),
            payment_types: BTreeSet::new(),
            notification_mode: NotificationMode::Instant,
            digest_hour,
            digest_minute,
            subscribed: false,
            last_digest_on: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Proof that a listing reached a subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub user_id: UserId,
    pub listing_id: ListingId,
    pub delivered_at: DateTime<Utc>,
    pub channel: String,
}

/// A message that exhausted its send attempts, kept for operator review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedDelivery {
    pub user_id: UserId,
    pub listing_ids: Vec<ListingId>,
    pub error: String,
    pub attempts: u32,
    pub failed_at: DateTime<Utc>,
}

/// Category of an audit trail entry.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AuditKind {
    /// A profile mutation was applied.
    ProfileUpdated,
    /// A message was given up on; its listings were not delivered.
    DeliveryFailed,
    /// A fetch cycle aborted before dispatch.
    CycleFailed,
}

/// One row of the append-only audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub kind: AuditKind,
    /// Subject of the event, when it concerns one subscriber.
    pub user_id: Option<UserId>,
    pub details: serde_json::Value,
    pub recorded_at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(kind: AuditKind, user_id: Option<UserId>, details: serde_json::Value) -> Self {
        Self {
            kind,
            user_id,
            details,
            recorded_at: Utc::now(),
        }
    }
}

/// A rendered message bound for one subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub user_id: UserId,
    pub text: String,
    /// Listings this message covers; written to the delivery record on success.
    pub listing_refs: Vec<ListingId>,
}

/// Aggregate counters reported by the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub listings: u64,
    pub profiles: u64,
    pub subscribed: u64,
    pub deliveries: u64,
    pub pending_digest: u64,
    pub failed_deliveries: u64,
    pub audit_events: u64,
}

/// What a retention purge removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeReport {
    pub listings_removed: u64,
    pub deliveries_removed: u64,
    pub failures_removed: u64,
    pub audit_events_removed: u64,
    /// Expired listings kept because a digest still references them.
    pub listings_retained: u64,
}

/// Health status of an adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    Healthy,
    Degraded(String),
    Unhealthy(String),
}

/// Classifies the role an adapter plays in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum AdapterType {
    Source,
    Sender,
    Store,
}
