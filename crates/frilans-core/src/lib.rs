// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Frilans listing pipeline.
//!
//! Holds the canonical listing and profile types, the shared error taxonomy,
//! and the adapter traits implemented by source fetchers, message senders,
//! and the persistent store. Every other crate in the workspace builds on
//! the vocabulary defined here.

pub mod error;
pub mod profile;
pub mod retry;
pub mod traits;
pub mod types;

pub use error::FrilansError;
pub use profile::ProfileMutation;
pub use retry::RetryPolicy;
pub use types::{
    AdapterType, AuditEvent, AuditKind, ExperienceLevel, HealthStatus, Listing, ListingId, MessageId, NotificationMode,
    PaymentType, ProjectType, RawListing, SourceKey, SourceKind, StoredListing,
    SubscriberProfile, UserId,
};

pub use traits::{Adapter, ListingStore, MessageSender, SourceFetcher};
