// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Frilans integration tests.
//!
//! Provides scripted adapters and a temp-database harness for fast,
//! deterministic tests without network access.
//!
//! # Components
//!
//! - [`ScriptedFetcher`] - source fetcher that replays a fixed script of outcomes
//! - [`RecordingSender`] - message sender that captures sends and fails on demand
//! - [`TestHarness`] - initialized SQLite store plus a fast-retry configuration
//! - [`FlakyStore`] - store wrapper that fails profile reads on demand

pub mod flaky_store;
pub mod harness;
pub mod recording_sender;
pub mod scripted_fetcher;

pub use flaky_store::FlakyStore;
pub use harness::TestHarness;
pub use recording_sender::RecordingSender;
pub use scripted_fetcher::{Script, ScriptedFetcher};
