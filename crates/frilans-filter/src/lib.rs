// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Filter and personalization engine.
//!
//! [`evaluate`] is a pure predicate over one listing and one profile.
//! [`match_cycle`] applies it to every new listing of a cycle against every
//! active profile and groups the survivors by subscriber.

pub mod matcher;
pub mod predicate;

pub use matcher::{CycleMatches, match_cycle};
pub use predicate::{CompiledProfile, RejectReason, evaluate, matches};
