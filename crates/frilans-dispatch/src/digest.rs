// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Daily digest delivery.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use frilans_core::types::{
    FailedDelivery, ListingId, NotificationMode, SubscriberProfile, UserId,
};

use crate::dispatcher::{BatchKind, DispatchReport, Dispatcher};

/// Outcome of one digest tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DigestReport {
    /// Subscribers whose digest came due this tick.
    pub due: usize,
    /// Due subscribers with nothing pending.
    pub empty: usize,
    /// Queued listings sent right away because their subscriber switched to
    /// instant notifications.
    pub redirected: usize,
    /// Queued listings given up on because their subscriber unsubscribed.
    pub dropped: usize,
    pub delivery: DispatchReport,
}

/// The local date a digest should be sent for, or `None` if not due.
///
/// A digest is due once local time reaches the subscriber's digest time
/// and none has been sent for today's local date. A tick that missed the
/// exact minute still fires later the same day.
pub fn digest_due(profile: &SubscriberProfile, now: DateTime<Utc>, tz: Tz) -> Option<NaiveDate> {
    if !profile.subscribed || profile.notification_mode != NotificationMode::DailyDigest {
        return None;
    }
    let local = now.with_timezone(&tz);
    let today = local.date_naive();
    let at = NaiveTime::from_hms_opt(
        u32::from(profile.digest_hour),
        u32::from(profile.digest_minute),
        0,
    )?;
    if local.time() < at {
        return None;
    }
    match profile.last_digest_on {
        Some(last) if last >= today => None,
        _ => Some(today),
    }
}

impl Dispatcher {
    /// Send every digest that is due at `now`, then settle queues left by
    /// subscribers who are no longer in digest mode.
    ///
    /// Pending items are removed once their message either succeeds or is
    /// recorded as a permanent failure. If the store cannot be read the
    /// day is left unmarked so the next tick tries again.
    pub async fn run_digest_tick(&self, now: DateTime<Utc>, tz: Tz) -> DigestReport {
        let mut report = DigestReport::default();
        let profiles = match self.store().get_active_profiles().await {
            Ok(p) => p,
            Err(e) => {
                error!(error = %e, "could not load profiles for digest");
                report.delivery.store_errors += 1;
                return report;
            }
        };

        let modes: HashMap<UserId, NotificationMode> = profiles
            .iter()
            .map(|p| (p.user_id, p.notification_mode))
            .collect();

        for profile in profiles {
            let Some(day) = digest_due(&profile, now, tz) else {
                continue;
            };
            report.due += 1;
            let user_id = profile.user_id;

            let pending = match self.store().pending_digest(user_id).await {
                Ok(p) => p,
                Err(e) => {
                    error!(%user_id, error = %e, "could not load pending digest");
                    report.delivery.store_errors += 1;
                    continue;
                }
            };

            if pending.is_empty() {
                report.empty += 1;
                debug!(%user_id, "digest due with nothing pending");
            } else {
                let ids: Vec<ListingId> = pending.iter().map(|s| s.id).collect();
                let outcome = self.deliver(user_id, pending, BatchKind::Digest).await;
                let store_failed = outcome.store_errors > 0;
                report.delivery.merge(outcome);
                if store_failed {
                    continue;
                }
                if let Err(e) = self.store().remove_from_digest(user_id, &ids).await {
                    error!(%user_id, error = %e, "could not clear pending digest");
                    report.delivery.store_errors += 1;
                    continue;
                }
            }

            if let Err(e) = self.store().mark_digest_sent(user_id, day).await {
                error!(%user_id, error = %e, "could not mark digest sent");
                report.delivery.store_errors += 1;
            }
        }

        self.settle_orphaned_queues(&modes, &mut report).await;

        if report.due > 0 || report.redirected > 0 || report.dropped > 0 {
            info!(
                due = report.due,
                sent = report.delivery.messages_sent,
                failed = report.delivery.failed_messages,
                redirected = report.redirected,
                dropped = report.dropped,
                "digest tick complete"
            );
        }
        report
    }

    /// Handle pending entries whose owner is not an active digest subscriber.
    ///
    /// Instant subscribers get them now. Anyone else (unsubscribed or
    /// without a profile) has them recorded as failed and removed.
    async fn settle_orphaned_queues(
        &self,
        modes: &HashMap<UserId, NotificationMode>,
        report: &mut DigestReport,
    ) {
        let users = match self.store().pending_digest_users().await {
            Ok(users) => users,
            Err(e) => {
                error!(error = %e, "could not list pending digest queues");
                report.delivery.store_errors += 1;
                return;
            }
        };

        for user_id in users {
            let mode = modes.get(&user_id).copied();
            if mode == Some(NotificationMode::DailyDigest) {
                continue;
            }
            let pending = match self.store().pending_digest(user_id).await {
                Ok(p) => p,
                Err(e) => {
                    error!(%user_id, error = %e, "could not load pending digest");
                    report.delivery.store_errors += 1;
                    continue;
                }
            };
            if pending.is_empty() {
                continue;
            }
            let ids: Vec<ListingId> = pending.iter().map(|s| s.id).collect();

            if mode == Some(NotificationMode::Instant) {
                let outcome = self.deliver(user_id, pending, BatchKind::Instant).await;
                let store_failed = outcome.store_errors > 0;
                report.delivery.merge(outcome);
                if store_failed {
                    continue;
                }
                report.redirected += ids.len();
                debug!(%user_id, listings = ids.len(), "sent queued digest items instantly");
            } else {
                warn!(%user_id, listings = ids.len(), "dropping digest queue of unsubscribed user");
                let failure = FailedDelivery {
                    user_id,
                    listing_ids: ids.clone(),
                    error: "subscriber unsubscribed before the digest was sent".into(),
                    attempts: 0,
                    failed_at: Utc::now(),
                };
                if let Err(e) = self.store().record_failed_delivery(&failure).await {
                    error!(%user_id, error = %e, "could not record dropped digest");
                    report.delivery.store_errors += 1;
                    continue;
                }
                report.dropped += ids.len();
            }

            if let Err(e) = self.store().remove_from_digest(user_id, &ids).await {
                error!(%user_id, error = %e, "could not clear pending digest");
                report.delivery.store_errors += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn digest_profile(hour: u8, minute: u8) -> SubscriberProfile {
        let created = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let mut p = SubscriberProfile::new(frilans_core::UserId(1), hour, minute, created);
        p.subscribed = true;
        p.notification_mode = NotificationMode::DailyDigest;
        p
    }

    #[test]
    fn not_due_before_digest_time() {
        let p = digest_profile(10, 0);
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 9, 59, 0).unwrap();
        assert_eq!(digest_due(&p, now, chrono_tz::UTC), None);
    }

    #[test]
    fn due_at_and_after_digest_time() {
        let p = digest_profile(10, 0);
        let at = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2026, 3, 2, 18, 30, 0).unwrap();
        let day = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        assert_eq!(digest_due(&p, at, chrono_tz::UTC), Some(day));
        assert_eq!(digest_due(&p, later, chrono_tz::UTC), Some(day));
    }

    #[test]
    fn sent_today_is_not_due_again() {
        let mut p = digest_profile(10, 0);
        p.last_digest_on = NaiveDate::from_ymd_opt(2026, 3, 2);
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 23, 0, 0).unwrap();
        assert_eq!(digest_due(&p, now, chrono_tz::UTC), None);

        let tomorrow = Utc.with_ymd_and_hms(2026, 3, 3, 10, 1, 0).unwrap();
        assert!(digest_due(&p, tomorrow, chrono_tz::UTC).is_some());
    }

    #[test]
    fn digest_time_is_local() {
        let p = digest_profile(10, 0);
        // 07:30 UTC is 10:30 in Moscow.
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 7, 30, 0).unwrap();
        assert!(digest_due(&p, now, chrono_tz::Europe::Moscow).is_some());
        assert_eq!(digest_due(&p, now, chrono_tz::UTC), None);
    }

    #[test]
    fn instant_subscribers_never_get_digests() {
        let mut p = digest_profile(0, 0);
        p.notification_mode = NotificationMode::Instant;
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap();
        assert_eq!(digest_due(&p, now, chrono_tz::UTC), None);
    }
}
