//! Trailing-edge debouncer
//!
//! Each `schedule` supersedes the previous one: only the job scheduled last
//! runs, `delay` after it was scheduled. Once a job's delay has elapsed it is
//! detached from the debouncer, so cancelling or rescheduling never aborts
//! work that has already started.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

#[derive(Default)]
struct Pending {
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

pub struct Debouncer {
    delay: Duration,
    pending: Arc<Mutex<Pending>>,
}

fn lock(pending: &Mutex<Pending>) -> MutexGuard<'_, Pending> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Arc::new(Mutex::new(Pending::default())),
        }
    }

    /// Run `job` after the quiet interval unless superseded first
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F, Fut>(&self, job: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut pending = lock(&self.pending);
        Self::cancel_locked(&mut pending);
        let generation = pending.generation;
        let delay = self.delay;
        let slot = Arc::clone(&self.pending);

        pending.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut pending = lock(&slot);
                if pending.generation != generation {
                    return;
                }
                // past this point the job is no longer abortable
                pending.handle = None;
            }
            job().await;
        }));
    }

    /// Drop the pending job, if any; returns whether one was pending
    pub fn cancel(&self) -> bool {
        let mut pending = lock(&self.pending);
        let was_pending = pending.handle.is_some();
        Self::cancel_locked(&mut pending);
        was_pending
    }

    pub fn is_pending(&self) -> bool {
        lock(&self.pending).handle.is_some()
    }

    fn cancel_locked(pending: &mut Pending) {
        pending.generation += 1;
        if let Some(handle) = pending.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_burst_runs_last_job_once() {
        let debouncer = Debouncer::new(Duration::from_millis(1000));
        let hits = Arc::new(Mutex::new(Vec::new()));

        for i in 0..5 {
            let hits = Arc::clone(&hits);
            debouncer.schedule(move || async move {
                hits.lock().unwrap().push(i);
            });
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        assert!(debouncer.is_pending());

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(*hits.lock().unwrap(), vec![4]);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_run() {
        let debouncer = Debouncer::new(Duration::from_millis(100));
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        debouncer.schedule(move || async move {
            c.fetch_add(1, Ordering::SeqCst);
        });
        assert!(debouncer.cancel());
        assert!(!debouncer.cancel());
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_started_job_is_not_aborted() {
        let debouncer = Debouncer::new(Duration::from_millis(10));
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        debouncer.schedule(move || async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            c.fetch_add(1, Ordering::SeqCst);
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!debouncer.is_pending());
        assert!(!debouncer.cancel());
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
