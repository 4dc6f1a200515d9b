use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

use crate::monitoring::metrics::{PollMetrics, PollOutcome};

#[derive(Debug, Clone, Copy)]
pub struct PollSpec {
    pub name: &'static str,
    pub period: Duration,
    /// Stop after the first successful fetch. Failures still retry every period.
    pub once: bool,
}

impl PollSpec {
    pub fn every(name: &'static str, period: Duration) -> Self {
        Self {
            name,
            period,
            once: false,
        }
    }

    pub fn until_success(name: &'static str, period: Duration) -> Self {
        Self {
            name,
            period,
            once: true,
        }
    }
}

/// A running poll loop. Dropping the handle stops it.
pub struct PollHandle {
    name: &'static str,
    alive: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst) && !self.task.is_finished()
    }

    pub fn stop(&self) {
        if self.alive.swap(false, Ordering::SeqCst) {
            debug!(poller = self.name, "Stopping poll loop");
        }
        self.task.abort();
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Run `fetch` on every tick (the first one fires immediately) and forward each
/// success to `tx`. A failure is logged and the next tick is the retry. A result that
/// arrives after [`PollHandle::stop`] is discarded.
pub fn spawn_poller<E, F, Fut>(
    poll: PollSpec,
    metrics: Arc<PollMetrics>,
    tx: mpsc::Sender<E>,
    mut fetch: F,
) -> PollHandle
where
    E: Send + 'static,
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<E>> + Send + 'static,
{
    let alive = Arc::new(AtomicBool::new(true));
    let flag = alive.clone();

    let task = tokio::spawn(async move {
        let mut ticker = interval(poll.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if !flag.load(Ordering::SeqCst) {
                break;
            }

            let outcome = fetch().await;

            if !flag.load(Ordering::SeqCst) {
                metrics.record(poll.name, PollOutcome::Dropped);
                debug!(poller = poll.name, "Discarding result of stopped poll");
                break;
            }

            match outcome {
                Ok(event) => {
                    metrics.record(poll.name, PollOutcome::Ok);
                    if tx.send(event).await.is_err() {
                        debug!(poller = poll.name, "Receiver gone, stopping");
                        break;
                    }
                    if poll.once {
                        break;
                    }
                }
                Err(e) => {
                    metrics.record(poll.name, PollOutcome::Error);
                    warn!(poller = poll.name, error = %e, "Poll failed, keeping previous data");
                }
            }
        }

        flag.store(false, Ordering::SeqCst);
    });

    PollHandle {
        name: poll.name,
        alive,
        task,
    }
}
