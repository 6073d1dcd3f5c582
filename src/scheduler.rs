//! Drives the engine on a fixed interval, plus the daily report task.
//!
//! Cycles are strictly serialized: the next evaluation cannot start until
//! the previous one finished across all assets, which is what makes the
//! ledger's check-then-act daily gate safe without locks. Sleeps are
//! shutdown-aware so Ctrl+C ends the loops promptly between cycles while
//! an in-flight cycle always completes.

use crate::engine::DcaEngine;
use crate::ledger::Ledger;
use crate::logger::{self, LogTag};
use crate::notifications::{EventSink, Notification};
use crate::shutdown;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::Duration;

/// Run evaluation cycles forever, `interval` apart, until shutdown.
pub async fn run_dca_loop(engine: Arc<DcaEngine>, interval: Duration) {
    logger::info(
        LogTag::Scheduler,
        &format!(
            "DCA loop started, evaluating every {:.1}h",
            interval.as_secs_f64() / 3600.0
        ),
    );

    loop {
        if shutdown::is_shutdown_requested() {
            break;
        }

        engine.run_cycle().await;

        logger::info(
            LogTag::Scheduler,
            &format!(
                "next evaluation in {:.1}h",
                interval.as_secs_f64() / 3600.0
            ),
        );

        if shutdown::sleep_interruptible(interval).await {
            break;
        }
    }

    logger::info(LogTag::Scheduler, "DCA loop stopped");
}

/// Emit a ledger summary once per day at `hour`:00 UTC.
pub async fn run_daily_report_loop(
    ledger: Arc<RwLock<Ledger>>,
    events: Arc<dyn EventSink>,
    hour: u32,
) {
    loop {
        let wait_secs = seconds_until_hour(Utc::now(), hour);
        logger::info(
            LogTag::Scheduler,
            &format!("next daily report in {} minutes", wait_secs / 60),
        );

        if shutdown::sleep_interruptible(Duration::from_secs(wait_secs as u64)).await {
            break;
        }

        let stats = ledger.read().await.stats(Utc::now());
        events.send(Notification::DailyReport { stats }).await;
    }

    logger::info(LogTag::Scheduler, "daily report loop stopped");
}

/// Seconds until the next occurrence of `hour`:00 UTC strictly after `now`.
pub fn seconds_until_hour(now: DateTime<Utc>, hour: u32) -> i64 {
    let hour = hour.min(23);
    let today = now
        .date_naive()
        .and_hms_opt(hour, 0, 0)
        .expect("00:00-23:00 is always a valid wall time")
        .and_utc();

    let target = if today <= now {
        today + ChronoDuration::days(1)
    } else {
        today
    };

    (target - now).num_seconds()
}
