use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;
use tokio::task::JoinHandle;
use tokio::time::{interval, interval_at, Instant};

use crate::controller::AttemptController;
use crate::core::config::TimerSettings;
use crate::core::time::format_offset;
use crate::schemas::HeartbeatPayload;
use crate::session::{AttemptStatus, CountdownStep};

/// Periods of the three background tasks that run while the attempt is
/// `IN_PROGRESS`. Tests shrink or stretch these.
#[derive(Debug, Clone, Copy)]
pub struct TaskIntervals {
    pub countdown: Duration,
    pub time_sync: Duration,
    pub heartbeat: Duration,
}

impl Default for TaskIntervals {
    fn default() -> Self {
        Self {
            countdown: Duration::from_secs(1),
            time_sync: Duration::from_secs(60),
            heartbeat: Duration::from_secs(30),
        }
    }
}

impl TaskIntervals {
    pub fn from_settings(timers: &TimerSettings) -> Self {
        Self {
            countdown: Duration::from_secs(timers.countdown_seconds),
            time_sync: Duration::from_secs(timers.time_sync_seconds),
            heartbeat: Duration::from_secs(timers.heartbeat_seconds),
        }
    }
}

/// Register the countdown, time-sync and heartbeat tasks. Each one watches
/// the session channel and exits within one scheduling tick of the status
/// leaving `IN_PROGRESS`; cancellation is cooperative.
pub(crate) fn spawn_attempt_tasks(controller: Arc<AttemptController>) -> Vec<JoinHandle<()>> {
    vec![
        tokio::spawn(countdown_loop(Arc::clone(&controller))),
        tokio::spawn(time_sync_loop(Arc::clone(&controller))),
        tokio::spawn(heartbeat_loop(controller)),
    ]
}

/// Local 1 s countdown. When it reaches exactly zero it triggers the same
/// finalize sequence as an explicit finish action, exactly once.
async fn countdown_loop(controller: Arc<AttemptController>) {
    let mut rx = controller.store().subscribe();
    if rx.borrow().status != AttemptStatus::InProgress {
        return;
    }

    let period = controller.intervals().countdown;
    // First tick lands one full period after entry so the countdown does
    // not lose a second at t=0.
    let mut tick = interval_at(Instant::now() + period, period);
    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() || rx.borrow().status != AttemptStatus::InProgress {
                    break;
                }
            }
            _ = tick.tick() => {
                if controller.store().decrement_time() == CountdownStep::Expired {
                    tracing::info!("local countdown reached zero; finalizing attempt");
                    if let Err(err) = controller.finalize().await {
                        tracing::error!(error = %err, "auto-submit after local expiry failed");
                    }
                }
            }
        }
    }
}

/// Periodic reconciliation against the server clock. The server value
/// overwrites the local countdown unconditionally; `expired=true` forces the
/// finalize path. Failures are logged and never surfaced to the candidate.
async fn time_sync_loop(controller: Arc<AttemptController>) {
    let mut rx = controller.store().subscribe();
    if rx.borrow().status != AttemptStatus::InProgress {
        return;
    }

    let mut tick = interval(controller.intervals().time_sync);
    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() || rx.borrow().status != AttemptStatus::InProgress {
                    break;
                }
            }
            _ = tick.tick() => {
                let session = controller.store().snapshot();
                let (Some(access_code), Some(token)) = (session.access_code, session.token) else {
                    continue;
                };
                match controller.backend().remaining_time(&access_code, &token).await {
                    Ok(status) => {
                        controller.store().apply_server_time(status);
                        if status.expired {
                            tracing::info!("server reports attempt expired; finalizing");
                            if let Err(err) = controller.finalize().await {
                                tracing::error!(error = %err, "auto-submit after server expiry failed");
                            }
                        }
                    }
                    Err(err) => {
                        metrics::counter!("attempt_time_sync_failures_total").increment(1);
                        tracing::warn!(error = %err, "time sync failed; continuing with local countdown");
                    }
                }
            }
        }
    }
}

/// Best-effort liveness beat: immediate, then every period. Failures never
/// affect session state or the next scheduled beat.
async fn heartbeat_loop(controller: Arc<AttemptController>) {
    let mut rx = controller.store().subscribe();
    if rx.borrow().status != AttemptStatus::InProgress {
        return;
    }

    let mut tick = interval(controller.intervals().heartbeat);
    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() || rx.borrow().status != AttemptStatus::InProgress {
                    break;
                }
            }
            _ = tick.tick() => {
                let session = controller.store().snapshot();
                let (Some(access_code), Some(token), Some(email), Some(attempt_id)) = (
                    session.access_code,
                    session.token,
                    session.candidate_email,
                    session.attempt_id,
                ) else {
                    continue;
                };
                let beat = HeartbeatPayload {
                    email,
                    attempt_id,
                    time_remaining: session.timer.remaining_seconds,
                    timestamp: format_offset(OffsetDateTime::now_utc()),
                };
                if let Err(err) = controller.backend().heartbeat(&access_code, &token, &beat).await {
                    metrics::counter!("attempt_heartbeat_failures_total").increment(1);
                    tracing::warn!(error = %err, "heartbeat failed");
                }
            }
        }
    }
}
