// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Frilans listing pipeline.

use thiserror::Error;

use crate::types::SourceKind;

/// The primary error type used across all Frilans adapter traits and pipeline stages.
#[derive(Debug, Error)]
pub enum FrilansError {
    /// Configuration errors (invalid TOML, missing required fields, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// A source could not be reached (network failure, HTTP error, rate limiting).
    #[error("source {source_kind} unavailable: {message}")]
    SourceUnavailable {
        source_kind: SourceKind,
        message: String,
    },

    /// A source answered but its payload no longer parses.
    #[error("source {source_kind} changed its format: {message}")]
    SourceFormatChanged {
        source_kind: SourceKind,
        message: String,
    },

    /// Persistence layer errors (connection, query failure, rolled-back transaction).
    #[error("persistence error: {source}")]
    Persistence {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Outbound delivery errors (transport failure, rejected chat, rate limiting).
    #[error("delivery error: {message}")]
    Delivery {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A profile update was rejected before touching stored state.
    #[error("invalid profile mutation: {0}")]
    InvalidProfileMutation(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl FrilansError {
    /// Whether another attempt at the same operation can reasonably succeed.
    ///
    /// A changed source format, a rejected mutation, or a bad configuration
    /// will fail identically on every retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FrilansError::SourceUnavailable { .. }
                | FrilansError::Timeout { .. }
                | FrilansError::Delivery { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn network_failures_are_retryable() {
        let err = FrilansError::SourceUnavailable {
            source_kind: SourceKind::Weblancer,
            message: "503".into(),
        };
        assert!(err.is_retryable());
        assert!(
            FrilansError::Timeout {
                duration: Duration::from_secs(5)
            }
            .is_retryable()
        );
    }

    #[test]
    fn format_changes_are_not_retryable() {
        let err = FrilansError::SourceFormatChanged {
            source_kind: SourceKind::Freemarket,
            message: "no project table".into(),
        };
        assert!(!err.is_retryable());
        assert!(!FrilansError::InvalidProfileMutation("x".into()).is_retryable());
    }

    #[test]
    fn display_names_the_source() {
        let err = FrilansError::SourceUnavailable {
            source_kind: SourceKind::Telegram,
            message: "flood wait".into(),
        };
        assert_eq!(err.to_string(), "source telegram unavailable: flood wait");
    }
}
