// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Periodic tasks for `serve`.
//!
//! The fetch cycle, digest tick, and retention purge each run on their own
//! timer and coordinate only through the store. On cancellation a task
//! stops taking new ticks; work already in flight gets the shutdown grace
//! period and is then dropped.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::pipeline::Pipeline;

/// Run all periodic tasks until `cancel` fires, then wait for them to stop.
pub async fn run(pipeline: Arc<Pipeline>, cancel: CancellationToken) {
    let config = pipeline.config().clone();
    let grace = config.daemon.shutdown_grace();

    info!(
        interval_mins = config.collector.fetch_interval().as_secs() / 60,
        fetchers = pipeline.collector().fetchers().len(),
        digest_tick_secs = config.digest.tick_secs,
        purge_interval_hours = config.retention.purge_interval_hours,
        "scheduler starting"
    );

    let fetch = {
        let p = pipeline.clone();
        tokio::spawn(run_periodic(
            "fetch",
            config.collector.fetch_interval(),
            grace,
            cancel.clone(),
            move || {
                let p = p.clone();
                async move {
                    if let Err(e) = p.run_cycle().await {
                        error!(error = %e, "fetch cycle failed; retrying next interval");
                    }
                }
            },
        ))
    };

    let digest = {
        let p = pipeline.clone();
        tokio::spawn(run_periodic(
            "digest",
            Duration::from_secs(config.digest.tick_secs.max(1)),
            grace,
            cancel.clone(),
            move || {
                let p = p.clone();
                async move {
                    p.run_digest(Utc::now()).await;
                }
            },
        ))
    };

    let purge = {
        let p = pipeline.clone();
        tokio::spawn(run_periodic(
            "purge",
            config.retention.purge_interval(),
            grace,
            cancel.clone(),
            move || {
                let p = p.clone();
                async move {
                    if let Err(e) = p.purge(Utc::now()).await {
                        error!(error = %e, "retention purge failed");
                    }
                }
            },
        ))
    };

    for (name, handle) in [("fetch", fetch), ("digest", digest), ("purge", purge)] {
        if let Err(e) = handle.await {
            error!(task = name, error = %e, "scheduled task panicked");
        }
    }
    info!("scheduler stopped");
}

/// Call `job` every `period`, starting immediately.
///
/// A tick that would overlap a still-running job is delayed rather than
/// queued.
pub async fn run_periodic<F, Fut>(
    name: &'static str,
    period: Duration,
    grace: Duration,
    cancel: CancellationToken,
    job: F,
) where
    F: Fn() -> Fut,
    Fut: Future<Output = ()>,
{
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = cancel.cancelled() => break,
        }

        debug!(task = name, "tick");
        let work = job();
        tokio::pin!(work);
        tokio::select! {
            _ = &mut work => {}
            _ = cancel.cancelled() => {
                info!(task = name, grace_secs = grace.as_secs(), "shutdown requested; finishing in-flight work");
                if tokio::time::timeout(grace, &mut work).await.is_err() {
                    warn!(task = name, "grace period elapsed; abandoning in-flight work");
                }
                break;
            }
        }
    }
    debug!(task = name, "task stopped");
}
