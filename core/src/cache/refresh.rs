use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;
use tracing::{debug, warn, Instrument};

/// Supervisor for fire-and-forget work such as cache refreshes.
///
/// Failures (including panics) are logged and counted, never propagated.
/// Callers get no handle to the spawned task.
#[derive(Clone, Default)]
pub struct BackgroundTasks {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    in_flight: AtomicUsize,
    failures: AtomicU64,
    idle: Notify,
}

struct InFlightGuard {
    inner: Arc<Inner>,
    completed: bool,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if !self.completed {
            self.inner.failures.fetch_add(1, Ordering::Relaxed);
        }
        if self.inner.in_flight.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.inner.idle.notify_waiters();
        }
    }
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn<F>(&self, label: String, task: F)
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.inner.in_flight.fetch_add(1, Ordering::AcqRel);
        let mut guard = InFlightGuard {
            inner: self.inner.clone(),
            completed: false,
        };
        let span = tracing::debug_span!(target: "clipseek.refresh", "background", task = %label);
        tokio::spawn(
            async move {
                match task.await {
                    Ok(()) => {
                        guard.completed = true;
                        debug!(target: "clipseek.refresh", "background task finished");
                    }
                    Err(err) => {
                        warn!(target: "clipseek.refresh", error = %err, "background task failed");
                    }
                }
                drop(guard);
            }
            .instrument(span),
        );
    }

    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::Acquire)
    }

    /// Failed or panicked tasks since creation.
    pub fn failures(&self) -> u64 {
        self.inner.failures.load(Ordering::Relaxed)
    }

    /// Resolves once no task is running.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            if self.in_flight() == 0 {
                return;
            }
            notified.await;
        }
    }
}
