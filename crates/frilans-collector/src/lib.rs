// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fetch cycle coordination for the Frilans listing pipeline.
//!
//! A [`Collector`] runs every registered
//! [`SourceFetcher`](frilans_core::SourceFetcher) concurrently, each with
//! its own timeout and retry budget, then normalizes the raw listings,
//! drops in-cycle duplicates, and persists the remainder in one store
//! transaction. The resulting [`CycleReport`] is the hand-off to matching.

pub mod cycle;
pub mod fetch;
pub mod normalize;

pub use cycle::{Collector, CycleReport};
pub use fetch::{SourceReport, SourceStatus, fetch_with_retry};
pub use normalize::normalize;
