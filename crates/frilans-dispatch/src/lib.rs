// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification dispatch for the Frilans pipeline.
//!
//! The [`Dispatcher`] turns per-user matches into outbound messages,
//! splitting large match sets into several messages, retrying transient
//! send failures with backoff, and recording each confirmed delivery so
//! no listing reaches the same subscriber twice. Daily-digest subscribers
//! have their matches queued and sent by [`Dispatcher::run_digest_tick`].

pub mod digest;
pub mod dispatcher;
pub mod format;
pub mod limiter;

pub use digest::{DigestReport, digest_due};
pub use dispatcher::{BatchKind, DispatchReport, Dispatcher};
pub use format::Renderer;
pub use limiter::SendLimiter;
