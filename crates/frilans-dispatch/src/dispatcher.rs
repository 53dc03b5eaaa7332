// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns per-user matches into deliveries.
//!
//! Sends for one user are serialized behind a per-user lock; different
//! users proceed concurrently, bounded by the [`SendLimiter`]. The store's
//! delivery record is consulted before every message and written after
//! every confirmed send, so a listing reaches a user at most once.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use frilans_config::model::DispatchConfig;
use frilans_core::types::{
    FailedDelivery, ListingId, NotificationMode, OutboundMessage, StoredListing, SubscriberProfile,
    UserId,
};
use frilans_core::{FrilansError, ListingStore, MessageSender, RetryPolicy};

use crate::format::Renderer;
use crate::limiter::SendLimiter;

/// Which template a batch is rendered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    Instant,
    Digest,
}

/// Counters for one dispatch pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub messages_sent: usize,
    pub listings_delivered: usize,
    pub already_delivered: usize,
    pub digest_enqueued: usize,
    pub failed_messages: usize,
    /// Users skipped because the store could not be read or written.
    pub store_errors: usize,
}

impl DispatchReport {
    pub fn merge(&mut self, other: DispatchReport) {
        self.messages_sent += other.messages_sent;
        self.listings_delivered += other.listings_delivered;
        self.already_delivered += other.already_delivered;
        self.digest_enqueued += other.digest_enqueued;
        self.failed_messages += other.failed_messages;
        self.store_errors += other.store_errors;
    }
}

pub struct Dispatcher {
    store: Arc<dyn ListingStore>,
    sender: Arc<dyn MessageSender>,
    limiter: SendLimiter,
    renderer: Renderer,
    max_per_message: usize,
    retry: RetryPolicy,
    user_locks: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn ListingStore>,
        sender: Arc<dyn MessageSender>,
        config: &DispatchConfig,
    ) -> Self {
        Self {
            store,
            sender,
            limiter: SendLimiter::new(
                config.max_concurrent_sends,
                Duration::from_millis(config.min_send_interval_ms),
            ),
            renderer: Renderer::new(config.description_max_chars),
            max_per_message: config.max_projects_per_notification.max(1),
            retry: RetryPolicy::new(
                config.max_send_attempts.saturating_sub(1),
                Duration::from_millis(config.retry_base_delay_ms),
                Duration::from_millis(config.retry_max_delay_ms),
            ),
            user_locks: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn store(&self) -> &Arc<dyn ListingStore> {
        &self.store
    }

    /// Deliver one cycle's matches: instant subscribers are sent to now,
    /// digest subscribers get the listings queued for their next digest.
    pub async fn dispatch_cycle(
        &self,
        matches: BTreeMap<UserId, Vec<StoredListing>>,
        profiles: &[SubscriberProfile],
    ) -> DispatchReport {
        let modes: HashMap<UserId, NotificationMode> = profiles
            .iter()
            .map(|p| (p.user_id, p.notification_mode))
            .collect();

        let per_user = matches.into_iter().map(|(user_id, listings)| {
            let mode = modes.get(&user_id).copied().unwrap_or_default();
            async move {
                match mode {
                    NotificationMode::Instant => {
                        self.deliver(user_id, listings, BatchKind::Instant).await
                    }
                    NotificationMode::DailyDigest => self.enqueue(user_id, &listings).await,
                }
            }
        });

        let mut report = DispatchReport::default();
        for outcome in join_all(per_user).await {
            report.merge(outcome);
        }
        if report != DispatchReport::default() {
            info!(
                sent = report.messages_sent,
                delivered = report.listings_delivered,
                queued = report.digest_enqueued,
                failed = report.failed_messages,
                "dispatch complete"
            );
        }
        report
    }

    async fn enqueue(&self, user_id: UserId, listings: &[StoredListing]) -> DispatchReport {
        let ids: Vec<ListingId> = listings.iter().map(|s| s.id).collect();
        match self.store.enqueue_digest(user_id, &ids).await {
            Ok(added) => {
                debug!(%user_id, added, "queued for digest");
                DispatchReport {
                    digest_enqueued: added,
                    ..Default::default()
                }
            }
            Err(e) => {
                error!(%user_id, error = %e, "could not queue digest listings");
                DispatchReport {
                    store_errors: 1,
                    ..Default::default()
                }
            }
        }
    }

    async fn user_lock(&self, user_id: UserId) -> Arc<Mutex<()>> {
        self.user_locks
            .lock()
            .await
            .entry(user_id)
            .or_default()
            .clone()
    }

    /// Drop the user's lock entry unless another delivery holds or awaits it.
    async fn release_user_lock(&self, user_id: UserId, lock: Arc<Mutex<()>>) {
        let mut locks = self.user_locks.lock().await;
        // One reference in the map, one in `lock`.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(&user_id);
        }
    }

    #[cfg(test)]
    pub(crate) async fn tracked_users(&self) -> usize {
        self.user_locks.lock().await.len()
    }

    /// Send `listings` to one user in messages of at most
    /// `max_projects_per_notification`, skipping anything already delivered.
    ///
    /// A message that exhausts its attempts is recorded as a permanent
    /// failure and the remaining messages are still attempted.
    pub async fn deliver(
        &self,
        user_id: UserId,
        listings: Vec<StoredListing>,
        kind: BatchKind,
    ) -> DispatchReport {
        let lock = self.user_lock(user_id).await;
        let report = {
            let _guard = lock.lock().await;
            self.deliver_locked(user_id, listings, kind).await
        };
        self.release_user_lock(user_id, lock).await;
        report
    }

    /// Split `pending` into messages that respect both the per-message
    /// listing cap and the sender's length limit.
    ///
    /// A single listing longer than the limit still gets its own message.
    fn plan_chunks<'a>(
        &self,
        pending: &'a [StoredListing],
        kind: BatchKind,
    ) -> Vec<&'a [StoredListing]> {
        let limit = self.sender.max_message_chars();
        // Header width is largest when part and parts are both at their maximum.
        let widest = pending.len().max(2);
        let fits = |chunk: &[StoredListing]| {
            limit.is_none_or(|limit| {
                let text = match kind {
                    BatchKind::Instant => self.renderer.instant(chunk, widest, widest),
                    BatchKind::Digest => self.renderer.digest(chunk, pending.len(), widest, widest),
                };
                text.chars().count() <= limit
            })
        };

        let mut chunks = Vec::new();
        let mut start = 0;
        while start < pending.len() {
            let mut end = start + 1;
            while end < pending.len()
                && end - start < self.max_per_message
                && fits(&pending[start..=end])
            {
                end += 1;
            }
            chunks.push(&pending[start..end]);
            start = end;
        }
        chunks
    }

    async fn deliver_locked(
        &self,
        user_id: UserId,
        listings: Vec<StoredListing>,
        kind: BatchKind,
    ) -> DispatchReport {
        let mut report = DispatchReport::default();

        let mut pending = Vec::with_capacity(listings.len());
        for stored in listings {
            match self.store.is_delivered(user_id, stored.id).await {
                Ok(true) => report.already_delivered += 1,
                Ok(false) => pending.push(stored),
                Err(e) => {
                    error!(%user_id, error = %e, "delivery lookup failed; skipping user this pass");
                    report.store_errors += 1;
                    return report;
                }
            }
        }
        if pending.is_empty() {
            return report;
        }

        let total = pending.len();
        let chunks = self.plan_chunks(&pending, kind);
        let parts = chunks.len();
        for (i, chunk) in chunks.into_iter().enumerate() {
            let text = match kind {
                BatchKind::Instant => self.renderer.instant(chunk, i + 1, parts),
                BatchKind::Digest => self.renderer.digest(chunk, total, i + 1, parts),
            };
            let msg = OutboundMessage {
                user_id,
                text,
                listing_refs: chunk.iter().map(|s| s.id).collect(),
            };

            match self.send_with_retry(&msg).await {
                Ok(attempts) => {
                    report.messages_sent += 1;
                    for id in &msg.listing_refs {
                        match self.store.record_delivery(user_id, *id, self.sender.name()).await {
                            Ok(true) => report.listings_delivered += 1,
                            Ok(false) => {
                                warn!(%user_id, listing_id = %id, "delivery already recorded")
                            }
                            Err(e) => {
                                error!(%user_id, listing_id = %id, error = %e, "could not record delivery");
                                report.store_errors += 1;
                            }
                        }
                    }
                    debug!(%user_id, part = i + 1, parts, attempts, "message delivered");
                }
                Err((e, attempts)) => {
                    report.failed_messages += 1;
                    error!(
                        %user_id,
                        listings = msg.listing_refs.len(),
                        attempts,
                        error = %e,
                        "delivery permanently failed"
                    );
                    let failure = FailedDelivery {
                        user_id,
                        listing_ids: msg.listing_refs.clone(),
                        error: e.to_string(),
                        attempts,
                        failed_at: Utc::now(),
                    };
                    if let Err(e) = self.store.record_failed_delivery(&failure).await {
                        error!(%user_id, error = %e, "could not record delivery failure");
                        report.store_errors += 1;
                    }
                }
            }
        }
        report
    }

    /// Returns the attempt count on success, or the last error and attempt count.
    async fn send_with_retry(&self, msg: &OutboundMessage) -> Result<u32, (FrilansError, u32)> {
        let max_attempts = self.retry.max_attempts();
        let mut attempt = 0;
        loop {
            let result = match self.limiter.acquire().await {
                Ok(_permit) => self.sender.send(msg.clone()).await,
                Err(e) => Err(e),
            };
            attempt += 1;
            let err = match result {
                Ok(_) => return Ok(attempt),
                Err(e) => e,
            };
            if !err.is_retryable() || attempt >= max_attempts {
                return Err((err, attempt));
            }
            let delay = self.retry.delay_for(attempt - 1);
            warn!(
                user_id = %msg.user_id,
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "send failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}
