// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules, one per table group.

pub mod audit;
pub mod deliveries;
pub mod digests;
pub mod listings;
pub mod maintenance;
pub mod profiles;
