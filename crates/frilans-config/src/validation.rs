// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization checks that serde attributes cannot express.

use crate::diagnostic::ConfigError;
use crate::model::{
    FloorAdjustment, FrilansConfig, MAX_DESCRIPTION_CHARS, MAX_FETCH_INTERVAL_MINS,
    MAX_PURGE_INTERVAL_HOURS, MIN_FETCH_INTERVAL_MINS,
};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration.
///
/// Collects every problem instead of stopping at the first one.
pub fn validate_config(config: &FrilansConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if !LOG_LEVELS.contains(&config.daemon.log_level.to_lowercase().as_str()) {
        fail(format!(
            "daemon.log_level `{}` must be one of {}",
            config.daemon.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    if config.collector.fetch_interval_mins > MAX_FETCH_INTERVAL_MINS {
        fail(format!(
            "collector.fetch_interval_mins must be at most {MAX_FETCH_INTERVAL_MINS}, got {}",
            config.collector.fetch_interval_mins
        ));
    }

    if config.collector.fetch_timeout_secs == 0 {
        fail("collector.fetch_timeout_secs must be at least 1".to_string());
    }

    if config.collector.retry_base_delay_ms > config.collector.retry_max_delay_ms {
        fail(format!(
            "collector.retry_base_delay_ms ({}) exceeds collector.retry_max_delay_ms ({})",
            config.collector.retry_base_delay_ms, config.collector.retry_max_delay_ms
        ));
    }

    let dispatch = &config.dispatch;
    if dispatch.max_projects_per_notification == 0 {
        fail("dispatch.max_projects_per_notification must be at least 1".to_string());
    }
    if dispatch.max_send_attempts == 0 {
        fail("dispatch.max_send_attempts must be at least 1".to_string());
    }
    if dispatch.max_concurrent_sends == 0 {
        fail("dispatch.max_concurrent_sends must be at least 1".to_string());
    }
    if dispatch.retry_base_delay_ms > dispatch.retry_max_delay_ms {
        fail(format!(
            "dispatch.retry_base_delay_ms ({}) exceeds dispatch.retry_max_delay_ms ({})",
            dispatch.retry_base_delay_ms, dispatch.retry_max_delay_ms
        ));
    }
    if !(10..=MAX_DESCRIPTION_CHARS).contains(&dispatch.description_max_chars) {
        fail(format!(
            "dispatch.description_max_chars must be between 10 and {MAX_DESCRIPTION_CHARS}, got {}",
            dispatch.description_max_chars
        ));
    }

    let digest = &config.digest;
    if digest.timezone.parse::<chrono_tz::Tz>().is_err() {
        fail(format!(
            "digest.timezone `{}` is not a known IANA timezone",
            digest.timezone
        ));
    }
    if digest.default_hour >= 24 {
        fail(format!(
            "digest.default_hour must be 0-23, got {}",
            digest.default_hour
        ));
    }
    if digest.default_minute >= 60 {
        fail(format!(
            "digest.default_minute must be 0-59, got {}",
            digest.default_minute
        ));
    }
    if !(1..=60).contains(&digest.tick_secs) {
        fail(format!(
            "digest.tick_secs must be between 1 and 60, got {}",
            digest.tick_secs
        ));
    }

    if config.retention.retention_days == 0 {
        fail("retention.retention_days must be at least 1".to_string());
    }
    if !(1..=MAX_PURGE_INTERVAL_HOURS).contains(&config.retention.purge_interval_hours) {
        fail(format!(
            "retention.purge_interval_hours must be between 1 and {MAX_PURGE_INTERVAL_HOURS}, got {}",
            config.retention.purge_interval_hours
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    if let Some(token) = &config.telegram.bot_token
        && token.trim().is_empty()
    {
        fail("telegram.bot_token must not be blank when set".to_string());
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Raise values that are legal but below an operational floor.
///
/// Runs before logging is set up, so every change is recorded in
/// `config.adjustments` for the caller to report.
pub fn apply_floors(config: &mut FrilansConfig) {
    if config.collector.fetch_interval_mins < MIN_FETCH_INTERVAL_MINS {
        config.adjustments.push(FloorAdjustment {
            key: "collector.fetch_interval_mins",
            configured: config.collector.fetch_interval_mins,
            applied: MIN_FETCH_INTERVAL_MINS,
        });
        config.collector.fetch_interval_mins = MIN_FETCH_INTERVAL_MINS;
    }
}
