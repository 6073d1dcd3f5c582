//! Graceful shutdown signaling.
//!
//! Ctrl+C (and SIGTERM on Unix) set a process-wide flag. Loops poll the
//! flag between units of work; the evaluation cycle in flight always runs
//! to completion so no order outcome is left unrecorded. A second Ctrl+C
//! forces immediate exit.

use crate::logger::{self, LogTag};
use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::time::{sleep, Duration};

static SHUTDOWN_REQUESTED: Lazy<AtomicBool> = Lazy::new(|| AtomicBool::new(false));

pub fn is_shutdown_requested() -> bool {
    SHUTDOWN_REQUESTED.load(Ordering::Acquire)
}

pub fn request_shutdown() {
    SHUTDOWN_REQUESTED.store(true, Ordering::Release);
}

/// Install Ctrl+C / SIGTERM handlers. Call once at startup.
pub fn install_shutdown_handlers() -> anyhow::Result<()> {
    ctrlc::set_handler(move || {
        if is_shutdown_requested() {
            eprintln!("second interrupt received - forcing immediate exit");
            std::process::exit(130);
        }
        println!("\nshutdown requested - finishing the current cycle before exit");
        request_shutdown();
    })?;

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::spawn(async move {
            sigterm.recv().await;
            logger::warning(LogTag::System, "SIGTERM received - shutting down");
            request_shutdown();
        });
    }

    Ok(())
}

/// Sleep for `duration`, waking early if shutdown is requested.
/// Returns `true` when the sleep was cut short by a shutdown request.
pub async fn sleep_interruptible(duration: Duration) -> bool {
    const SLICE: Duration = Duration::from_millis(500);
    let mut remaining = duration;

    while !remaining.is_zero() {
        if is_shutdown_requested() {
            return true;
        }
        let step = remaining.min(SLICE);
        sleep(step).await;
        remaining = remaining.saturating_sub(step);
    }

    is_shutdown_requested()
}
