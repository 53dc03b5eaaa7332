// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Source fetcher contract, one implementation per external source.

use async_trait::async_trait;

use crate::error::FrilansError;
use crate::traits::adapter::Adapter;
use crate::types::{RawListing, SourceKind};

/// Produces the listings currently published by one external source.
///
/// Implementations must not hold shared mutable state: the collector calls
/// every fetcher concurrently and may call the same fetcher again after a
/// failure. Network failures are reported as
/// [`FrilansError::SourceUnavailable`]; payloads that no longer parse as
/// [`FrilansError::SourceFormatChanged`].
#[async_trait]
pub trait SourceFetcher: Adapter {
    /// The source tag stamped on every listing this fetcher produces.
    fn source(&self) -> SourceKind;

    /// Fetch the current batch of raw listings.
    async fn fetch(&self) -> Result<Vec<RawListing>, FrilansError>;
}
