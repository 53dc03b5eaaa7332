// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for the Frilans listing pipeline.
//!
//! A WAL-mode database with embedded refinery migrations, driven through a
//! single `tokio-rusqlite` connection so every write is serialized on one
//! background thread. [`SqliteStore`] implements
//! [`ListingStore`](frilans_core::ListingStore) on top of the typed query
//! modules.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;
mod rows;

pub use adapter::SqliteStore;
pub use database::Database;
