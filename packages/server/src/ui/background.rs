//! Periodic background tasks: idle reaping and rate-limit cleanup.
//!
//! Both timers fire for the first time one full period after start and
//! delay (rather than burst) when a tick is missed.

use std::{sync::Arc, time::Duration};

use tokio::{
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval_at},
};

use crate::{
    domain::RateLimiter, infrastructure::dto::conversion::user_list_message,
    usecase::ReapIdleParticipantsUseCase,
};

/// Spawn the idle reaper.
///
/// Every `period`, participants idle for longer than `idle_timeout` are
/// evicted and, if any were, the participant list is broadcast once.
///
/// `period` must be non-zero and at most [`MAX_PERIOD_SECS`](crate::config::MAX_PERIOD_SECS) seconds.
pub fn spawn_idle_reaper(
    usecase: Arc<ReapIdleParticipantsUseCase>,
    idle_timeout: Duration,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            reap_once(&usecase, idle_timeout).await;
        }
    })
}

async fn reap_once(usecase: &ReapIdleParticipantsUseCase, idle_timeout: Duration) {
    let Some(report) = usecase.execute(idle_timeout).await else {
        tracing::trace!("Idle sweep found nothing to evict");
        return;
    };

    tracing::info!(
        "Evicted {} idle participant(s), {} remaining",
        report.evicted.len(),
        report.remaining.ids().len()
    );
    match user_list_message(report.remaining.ids().to_vec()).to_json() {
        Ok(json) => {
            usecase
                .broadcast_participant_list(report.remaining, &json)
                .await
        }
        Err(e) => tracing::error!("Failed to serialize participant list: {}", e),
    }
}

/// Spawn the rate-limit entry cleanup.
///
/// `period` must be non-zero and at most [`MAX_PERIOD_SECS`](crate::config::MAX_PERIOD_SECS) seconds.
pub fn spawn_rate_limit_cleanup(
    rate_limiter: Arc<dyn RateLimiter>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let removed = rate_limiter.cleanup().await;
            if removed > 0 {
                tracing::debug!("Removed {} expired rate limit entries", removed);
            }
        }
    })
}
