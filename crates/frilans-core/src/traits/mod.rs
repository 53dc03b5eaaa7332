// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the pipeline's pluggable edges.
//!
//! Sources, senders, and the store all extend the [`Adapter`] base trait and
//! use `#[async_trait]` so they can be held as trait objects.

pub mod adapter;
pub mod sender;
pub mod source;
pub mod store;

pub use adapter::Adapter;
pub use sender::MessageSender;
pub use source::SourceFetcher;
pub use store::ListingStore;
