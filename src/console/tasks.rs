//! Recurring background tasks of the console.
//!
//! Each task is owned through a `TaskGuard`: dropping the guard aborts the
//! task, so timers never outlive the page that started them. In-flight
//! requests of an aborted poll are simply dropped.

use crate::store::{Collection, Store};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tracing::debug;

/// How often a disabled (zero-interval) poller re-reads its settings.
const IDLE_RECHECK: Duration = Duration::from_secs(1);

/// Handle on a spawned task; aborts it when dropped.
pub struct TaskGuard {
    name: &'static str,
    handle: JoinHandle<()>,
}

impl TaskGuard {
    pub fn spawn<F>(name: &'static str, task: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        debug!(task = name, "Starting task");
        Self {
            name,
            handle: tokio::spawn(task),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.handle.abort();
        debug!(task = self.name, "Stopped task");
    }
}

/// Re-fetch both collections every polling interval.
///
/// A tick is a no-op when polling is disabled, the interval is zero, or the
/// page has switched to demo mode. Fetch failures only update the store's
/// error; the next tick tries again.
pub fn spawn_polling(store: Store, demo: Arc<AtomicBool>) -> TaskGuard {
    TaskGuard::spawn("polling", async move {
        loop {
            let (_, interval) = store.polling_settings().await;
            if interval.is_zero() {
                sleep(IDLE_RECHECK).await;
                continue;
            }
            sleep(interval).await;

            let (enabled, _) = store.polling_settings().await;
            if !enabled || demo.load(Ordering::SeqCst) {
                continue;
            }

            let (requests, deferred) = tokio::join!(
                store.fetch_requests(false),
                store.fetch_deferred_actions(false)
            );
            if let Err(e) = deferred {
                debug!("Polling deferred actions failed: {}", e);
                store.report_fetch_failure(Collection::Deferred, &e).await;
            }
            if let Err(e) = requests {
                debug!("Polling requests failed: {}", e);
                store.report_fetch_failure(Collection::Requests, &e).await;
            }
        }
    })
}

/// Demo mode only: count every record down by `step_secs` each `tick`.
pub fn spawn_countdown(
    store: Store,
    demo: Arc<AtomicBool>,
    tick: Duration,
    step_secs: i64,
) -> TaskGuard {
    TaskGuard::spawn("countdown", async move {
        let mut ticker = interval_at(Instant::now() + tick, tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if !demo.load(Ordering::SeqCst) {
                continue;
            }
            store.tick_countdown(step_secs).await;
        }
    })
}
