// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `frilans status` command implementation.
//!
//! Reads store counters, the most recent permanent delivery failures, and
//! the latest audit entries straight from the database; the daemon does not
//! need to be running.

use std::io::IsTerminal;

use chrono::{DateTime, Utc};
use frilans_config::FrilansConfig;
use frilans_core::types::{AuditEvent, FailedDelivery, StoreStats};
use frilans_core::{FrilansError, ListingStore};
use serde::Serialize;

use crate::serve::open_store;

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub database_path: String,
    pub stats: StoreStats,
    pub recent_failures: Vec<FailedDelivery>,
    pub recent_audit: Vec<AuditEvent>,
}

/// Format how long ago `at` was, relative to `now`.
fn format_age(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - at).num_seconds().max(0);
    let days = secs / 86400;
    let hours = (secs % 86400) / 3600;
    let minutes = (secs % 3600) / 60;

    if days > 0 {
        format!("{days}d {hours}h ago")
    } else if hours > 0 {
        format!("{hours}h {minutes}m ago")
    } else {
        format!("{minutes}m ago")
    }
}

/// One line of the audit listing, without the leading marker.
fn audit_line(event: &AuditEvent, now: DateTime<Utc>) -> String {
    let subject = event
        .user_id
        .map(|u| format!("user {u}"))
        .unwrap_or_else(|| "system".to_string());
    let summary = match event.details.get("mutation").and_then(|m| m.as_str()) {
        Some(mutation) => mutation.to_string(),
        None => event
            .details
            .get("error")
            .and_then(|e| e.as_str())
            .unwrap_or_default()
            .to_string(),
    };
    format!(
        "{} {subject} ({}): {summary}",
        event.kind,
        format_age(event.recorded_at, now)
    )
}

async fn collect_status(
    store: &dyn ListingStore,
    config: &FrilansConfig,
    failure_limit: usize,
    audit_limit: usize,
) -> Result<StatusResponse, FrilansError> {
    Ok(StatusResponse {
        database_path: config.storage.database_path.clone(),
        stats: store.stats().await?,
        recent_failures: store.recent_failed_deliveries(failure_limit).await?,
        recent_audit: store.recent_audit_events(audit_limit).await?,
    })
}

/// Run the `frilans status` command.
///
/// If `--plain` is passed or stdout is not a TTY, colors are disabled.
pub async fn run_status(
    config: &FrilansConfig,
    json: bool,
    plain: bool,
    failure_limit: usize,
    audit_limit: usize,
) -> Result<(), FrilansError> {
    let store = open_store(config).await?;
    let resp = collect_status(&*store, config, failure_limit, audit_limit).await;
    store.close().await?;
    let resp = resp?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&resp).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        let use_color = !plain && std::io::stdout().is_terminal();
        print_status(&resp, Utc::now(), use_color);
    }
    Ok(())
}

fn print_status(resp: &StatusResponse, now: DateTime<Utc>, use_color: bool) {
    let s = &resp.stats;
    println!();
    println!("  frilans status");
    println!("  {}", "-".repeat(35));
    println!("    Database:        {}", resp.database_path);
    println!("    Listings:        {}", s.listings);
    println!("    Profiles:        {} ({} subscribed)", s.profiles, s.subscribed);
    println!("    Deliveries:      {}", s.deliveries);
    println!("    Pending digest:  {}", s.pending_digest);
    println!("    Audit entries:   {}", s.audit_events);

    if use_color {
        use colored::Colorize;
        let failed = s.failed_deliveries.to_string();
        let failed = if s.failed_deliveries == 0 {
            failed.green()
        } else {
            failed.red()
        };
        println!("    Failed:          {failed}");
    } else {
        println!("    Failed:          {}", s.failed_deliveries);
    }

    if !resp.recent_failures.is_empty() {
        println!();
        println!("  recent failures");
        println!("  {}", "-".repeat(35));
        for f in &resp.recent_failures {
            let marker = if use_color {
                use colored::Colorize;
                "✗".red().to_string()
            } else {
                "[FAIL]".to_string()
            };
            println!(
                "    {marker} user {} ({} listing(s), {} attempt(s), {}): {}",
                f.user_id,
                f.listing_ids.len(),
                f.attempts,
                format_age(f.failed_at, now),
                f.error
            );
        }
    }

    if !resp.recent_audit.is_empty() {
        println!();
        println!("  recent activity");
        println!("  {}", "-".repeat(35));
        for event in &resp.recent_audit {
            println!("    {}", audit_line(event, now));
        }
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use frilans_core::ProfileMutation;
    use frilans_core::types::{AuditKind, ListingId, UserId};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 10, h, m, 0).unwrap()
    }

    #[test]
    fn format_age_minutes() {
        assert_eq!(format_age(at(10, 0), at(10, 2)), "2m ago");
    }

    #[test]
    fn format_age_hours() {
        assert_eq!(format_age(at(9, 0), at(10, 2)), "1h 2m ago");
    }

    #[test]
    fn format_age_days() {
        let then = Utc.with_ymd_and_hms(2026, 4, 8, 9, 0, 0).unwrap();
        assert_eq!(format_age(then, at(10, 0)), "2d 1h ago");
    }

    #[test]
    fn future_timestamps_read_as_now() {
        assert_eq!(format_age(at(11, 0), at(10, 0)), "0m ago");
    }

    #[test]
    fn status_response_serializes() {
        let resp = StatusResponse {
            database_path: "/var/lib/frilans/frilans.db".into(),
            stats: StoreStats {
                listings: 12,
                subscribed: 3,
                ..Default::default()
            },
            recent_failures: vec![FailedDelivery {
                user_id: UserId(7),
                listing_ids: vec![ListingId(1), ListingId(2)],
                error: "chat not found".into(),
                attempts: 3,
                failed_at: at(8, 0),
            }],
            recent_audit: Vec::new(),
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"listings\":12"));
        assert!(json.contains("\"error\":\"chat not found\""));
    }

    #[tokio::test]
    async fn status_reads_an_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = FrilansConfig::default();
        config.storage.database_path = dir.path().join("status.db").to_string_lossy().into_owned();
        run_status(&config, true, true, 5, 5).await.unwrap();
    }

    #[test]
    fn audit_lines_name_subject_and_change() {
        let mut event = AuditEvent::new(
            AuditKind::ProfileUpdated,
            Some(UserId(5)),
            serde_json::json!({ "mutation": "set_budget" }),
        );
        event.recorded_at = at(9, 0);
        assert_eq!(
            audit_line(&event, at(10, 30)),
            "profile_updated user 5 (1h 30m ago): set_budget"
        );

        let mut failed = AuditEvent::new(
            AuditKind::CycleFailed,
            None,
            serde_json::json!({ "error": "database is locked" }),
        );
        failed.recorded_at = at(10, 0);
        assert_eq!(
            audit_line(&failed, at(10, 0)),
            "cycle_failed system (0m ago): database is locked"
        );
    }

    #[tokio::test]
    async fn status_includes_profile_changes() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = FrilansConfig::default();
        config.storage.database_path = dir.path().join("audit.db").to_string_lossy().into_owned();
        let store = open_store(&config).await.unwrap();
        store
            .apply_profile_mutation(UserId(21), ProfileMutation::Subscribe)
            .await
            .unwrap();
        store
            .apply_profile_mutation(UserId(21), ProfileMutation::AddKeywords(vec!["rust".into()]))
            .await
            .unwrap();

        let resp = collect_status(&*store, &config, 5, 1).await.unwrap();
        assert_eq!(resp.stats.audit_events, 2);
        assert_eq!(resp.recent_audit.len(), 1);
        assert_eq!(resp.recent_audit[0].kind, AuditKind::ProfileUpdated);
        assert_eq!(resp.recent_audit[0].details["mutation"], "add_keywords");
    }
}
