// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Source fetcher that replays a script.
//!
//! Call `n` returns script entry `n`; once the script runs out the last
//! entry repeats. An empty script always returns no listings.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use frilans_core::types::{AdapterType, RawListing, SourceKind};
use frilans_core::{Adapter, FrilansError, SourceFetcher};

/// One scripted fetch outcome.
#[derive(Debug, Clone)]
pub enum Script {
    Listings(Vec<RawListing>),
    Unavailable(String),
    FormatChanged(String),
    /// Never completes; exercises the per-attempt timeout.
    Hang,
}

pub struct ScriptedFetcher {
    name: String,
    source: SourceKind,
    script: Vec<Script>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new(source: SourceKind, script: Vec<Script>) -> Self {
        Self {
            name: format!("scripted-{source}"),
            source,
            script,
            calls: AtomicUsize::new(0),
        }
    }

    /// A fetcher that returns the same listings on every call.
    pub fn always(source: SourceKind, listings: Vec<RawListing>) -> Self {
        Self::new(source, vec![Script::Listings(listings)])
    }

    /// Number of times `fetch` has been called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Adapter for ScriptedFetcher {
    fn name(&self) -> &str {
        &self.name
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Source
    }
}

#[async_trait]
impl SourceFetcher for ScriptedFetcher {
    fn source(&self) -> SourceKind {
        self.source
    }

    async fn fetch(&self) -> Result<Vec<RawListing>, FrilansError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let Some(step) = self.script.get(call).or_else(|| self.script.last()) else {
            return Ok(Vec::new());
        };
        match step.clone() {
            Script::Listings(listings) => Ok(listings),
            Script::Unavailable(message) => Err(FrilansError::SourceUnavailable {
                source_kind: self.source,
                message,
            }),
            Script::FormatChanged(message) => Err(FrilansError::SourceFormatChanged {
                source_kind: self.source,
                message,
            }),
            Script::Hang => std::future::pending().await,
        }
    }
}
