// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pipeline wiring for Frilans.
//!
//! [`Pipeline`] runs the one-way flow fetchers → collector → filter →
//! dispatcher, and [`scheduler::run`] drives it from three independent
//! periodic tasks (fetch cycle, digest tick, retention purge) that share
//! nothing but the store.

pub mod pipeline;
pub mod scheduler;
pub mod shutdown;

pub use pipeline::{CycleOutcome, Pipeline};
pub use shutdown::install_signal_handler;
