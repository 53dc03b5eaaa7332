// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! Every struct uses `#[serde(deny_unknown_fields)]` so a misspelled key
//! fails at startup instead of silently falling back to a default.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Fetch cycles may not run more often than this, to respect source rate limits.
pub const MIN_FETCH_INTERVAL_MINS: u64 = 30;

/// One week. Longer intervals are treated as configuration mistakes.
pub const MAX_FETCH_INTERVAL_MINS: u64 = 7 * 24 * 60;

/// One year.
pub const MAX_PURGE_INTERVAL_HOURS: u64 = 365 * 24;

/// Upper bound on per-listing description length, well under a 4096-char message.
pub const MAX_DESCRIPTION_CHARS: usize = 1000;

/// A configured value that was raised to its operational floor during loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FloorAdjustment {
    pub key: &'static str,
    pub configured: u64,
    pub applied: u64,
}

/// Top-level configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FrilansConfig {
    #[serde(default)]
    pub daemon: DaemonConfig,

    #[serde(default)]
    pub collector: CollectorConfig,

    #[serde(default)]
    pub dispatch: DispatchConfig,

    #[serde(default)]
    pub digest: DigestConfig,

    #[serde(default)]
    pub retention: RetentionConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Values raised during loading. Logged once tracing is installed.
    #[serde(skip)]
    pub adjustments: Vec<FloorAdjustment>,
}

/// Process-level settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DaemonConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// How long in-flight fetches and sends may run after a shutdown signal.
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
        }
    }
}

impl DaemonConfig {
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_shutdown_grace_secs() -> u64 {
    10
}

/// Fetch cycle settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CollectorConfig {
    /// Minutes between fetch cycles. Values below 30 are raised to 30.
    #[serde(default = "default_fetch_interval_mins")]
    pub fetch_interval_mins: u64,

    /// Per-attempt timeout for a single fetcher.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Retries after the first failed attempt, per fetcher per cycle.
    #[serde(default = "default_fetch_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_fetch_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    #[serde(default = "default_fetch_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            fetch_interval_mins: default_fetch_interval_mins(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            max_retries: default_fetch_max_retries(),
            retry_base_delay_ms: default_fetch_retry_base_delay_ms(),
            retry_max_delay_ms: default_fetch_retry_max_delay_ms(),
        }
    }
}

impl CollectorConfig {
    pub fn fetch_interval(&self) -> Duration {
        Duration::from_secs(
            self.fetch_interval_mins
                .max(MIN_FETCH_INTERVAL_MINS)
                .saturating_mul(60),
        )
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

fn default_fetch_interval_mins() -> u64 {
    60
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

fn default_fetch_max_retries() -> u32 {
    2
}

fn default_fetch_retry_base_delay_ms() -> u64 {
    1_000
}

fn default_fetch_retry_max_delay_ms() -> u64 {
    30_000
}

/// Outbound delivery settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchConfig {
    /// Listings per message; larger match sets are split, never truncated.
    #[serde(default = "default_max_projects_per_notification")]
    pub max_projects_per_notification: usize,

    /// Attempts per message before it is recorded as permanently failed.
    #[serde(default = "default_max_send_attempts")]
    pub max_send_attempts: u32,

    #[serde(default = "default_send_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    #[serde(default = "default_send_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,

    /// Sends allowed in flight at once across all subscribers.
    #[serde(default = "default_max_concurrent_sends")]
    pub max_concurrent_sends: usize,

    /// Minimum spacing between consecutive sends.
    #[serde(default = "default_min_send_interval_ms")]
    pub min_send_interval_ms: u64,

    /// Descriptions longer than this are cut and end with an ellipsis.
    #[serde(default = "default_description_max_chars")]
    pub description_max_chars: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_projects_per_notification: default_max_projects_per_notification(),
            max_send_attempts: default_max_send_attempts(),
            retry_base_delay_ms: default_send_retry_base_delay_ms(),
            retry_max_delay_ms: default_send_retry_max_delay_ms(),
            max_concurrent_sends: default_max_concurrent_sends(),
            min_send_interval_ms: default_min_send_interval_ms(),
            description_max_chars: default_description_max_chars(),
        }
    }
}

fn default_max_projects_per_notification() -> usize {
    5
}

fn default_max_send_attempts() -> u32 {
    3
}

fn default_send_retry_base_delay_ms() -> u64 {
    2_000
}

fn default_send_retry_max_delay_ms() -> u64 {
    60_000
}

fn default_max_concurrent_sends() -> usize {
    4
}

fn default_min_send_interval_ms() -> u64 {
    100
}

fn default_description_max_chars() -> usize {
    300
}

/// Daily digest settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DigestConfig {
    /// IANA timezone digest times are interpreted in.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Digest time given to newly created profiles.
    #[serde(default = "default_digest_hour")]
    pub default_hour: u8,

    #[serde(default)]
    pub default_minute: u8,

    /// Seconds between digest due-checks.
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            default_hour: default_digest_hour(),
            default_minute: 0,
            tick_secs: default_tick_secs(),
        }
    }
}

impl DigestConfig {
    /// The configured timezone, falling back to UTC if it does not parse.
    pub fn tz(&self) -> chrono_tz::Tz {
        self.timezone.parse().unwrap_or(chrono_tz::UTC)
    }
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_digest_hour() -> u8 {
    10
}

fn default_tick_secs() -> u64 {
    60
}

/// Data retention settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetentionConfig {
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,

    #[serde(default = "default_purge_interval_hours")]
    pub purge_interval_hours: u64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            retention_days: default_retention_days(),
            purge_interval_hours: default_purge_interval_hours(),
        }
    }
}

impl RetentionConfig {
    pub fn purge_interval(&self) -> Duration {
        Duration::from_secs(self.purge_interval_hours.max(1).saturating_mul(3600))
    }
}

fn default_retention_days() -> u32 {
    30
}

fn default_purge_interval_hours() -> u64 {
    24
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("frilans").join("frilans.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("frilans.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Telegram Bot API settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Bot API token. Required by `serve` and `digest`; unused otherwise.
    #[serde(default)]
    pub bot_token: Option<String>,
}
