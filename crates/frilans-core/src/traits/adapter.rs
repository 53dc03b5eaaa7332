// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base adapter trait that every pluggable component implements.

use async_trait::async_trait;

use crate::error::FrilansError;
use crate::types::{AdapterType, HealthStatus};

/// Identity, health, and lifecycle shared by fetchers, senders, and stores.
#[async_trait]
pub trait Adapter: Send + Sync + 'static {
    /// Returns the human-readable name of this adapter instance.
    fn name(&self) -> &str;

    /// Returns the role this adapter plays in the pipeline.
    fn adapter_type(&self) -> AdapterType;

    /// Performs a health check and returns the adapter's current status.
    async fn health_check(&self) -> Result<HealthStatus, FrilansError> {
        Ok(HealthStatus::Healthy)
    }

    /// Releases any held resources.
    async fn shutdown(&self) -> Result<(), FrilansError> {
        Ok(())
    }
}
