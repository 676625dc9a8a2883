//! Stoppable periodic background work.
//!
//! A client owns one [`Sweeper`] per periodic job (cache expiry, limiter
//! cleanup). The task is stopped by [`Sweeper::stop`], and also when the
//! sweeper is dropped, so a forgotten client never leaks a timer.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

struct Running {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Handle to a periodic background task.
pub struct Sweeper {
    name: &'static str,
    running: Mutex<Option<Running>>,
}

impl std::fmt::Debug for Sweeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sweeper")
            .field("name", &self.name)
            .field("running", &self.is_running())
            .finish()
    }
}

impl Sweeper {
    /// Run `job` every `every`, starting one period from now.
    ///
    /// Outside a tokio runtime no task is spawned and the returned sweeper is
    /// inert; lazy expiry still applies in that case.
    pub fn spawn<F>(name: &'static str, every: Duration, mut job: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(sweeper = name, "No tokio runtime, background sweep disabled");
            return Self {
                name,
                running: Mutex::new(None),
            };
        };

        let (stop_tx, mut stop_rx) = watch::channel(false);
        let handle = runtime.spawn(async move {
            tracing::debug!(sweeper = name, every_ms = every.as_millis() as u64, "Sweeper started");

            let mut ticker = interval_at(Instant::now() + every, every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;

                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => job(),
                }
            }

            tracing::debug!(sweeper = name, "Sweeper stopped");
        });

        Self {
            name,
            running: Mutex::new(Some(Running { stop_tx, handle })),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|r| !r.handle.is_finished())
    }

    /// Signal the task to stop. Idempotent.
    pub fn stop(&self) {
        let running = self
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(running) = running {
            let _ = running.stop_tx.send(true);
        }
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        let running = self
            .running
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(running) = running {
            running.handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn runs_job_on_every_tick_until_stopped() {
        let count = Arc::new(AtomicUsize::new(0));
        let job_count = Arc::clone(&count);
        let sweeper = Sweeper::spawn("test", Duration::from_secs(10), move || {
            job_count.fetch_add(1, Ordering::SeqCst);
        });
        assert!(sweeper.is_running());

        tokio::time::sleep(Duration::from_secs(35)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);

        sweeper.stop();
        tokio::time::sleep(Duration::from_secs(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert!(!sweeper.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_idempotent() {
        let sweeper = Sweeper::spawn("idle", Duration::from_secs(1), || {});
        sweeper.stop();
        sweeper.stop();
        assert!(!sweeper.is_running());
        assert_eq!(sweeper.name(), "idle");
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_sweeper_stops_the_job() {
        let count = Arc::new(AtomicUsize::new(0));
        let job_count = Arc::clone(&count);
        let sweeper = Sweeper::spawn("dropped", Duration::from_secs(1), move || {
            job_count.fetch_add(1, Ordering::SeqCst);
        });
        drop(sweeper);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn spawn_outside_runtime_is_inert() {
        let sweeper = Sweeper::spawn("no-runtime", Duration::from_secs(1), || {});
        assert!(!sweeper.is_running());
        sweeper.stop();
    }
}
