use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::dispatcher::{DispatchTask, Dispatcher};

pub const DEFAULT_MAX_REQUESTS: usize = 64;

/// Runs dispatched tasks on a tokio runtime, at most `max_requests` at a time.
///
/// Tasks beyond the limit are spawned right away but wait for a permit before running, and
/// are counted as queued until then.
#[derive(Clone)]
pub struct TokioDispatcher {
    handle: Handle,
    permits: Arc<Semaphore>,
    max_requests: usize,
    running: Arc<AtomicUsize>,
    queued: Arc<AtomicUsize>,
}

impl TokioDispatcher {
    pub fn new(handle: Handle, max_requests: usize) -> Self {
        let max_requests = max_requests.clamp(1, Semaphore::MAX_PERMITS);
        Self {
            handle,
            permits: Arc::new(Semaphore::new(max_requests)),
            max_requests,
            running: Arc::new(AtomicUsize::new(0)),
            queued: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Uses the runtime of the calling context, if there is one.
    pub fn try_current(max_requests: usize) -> Option<Self> {
        Handle::try_current().ok().map(|handle| Self::new(handle, max_requests))
    }

    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    pub fn running_calls(&self) -> usize {
        self.running.load(Ordering::Acquire)
    }

    pub fn queued_calls(&self) -> usize {
        self.queued.load(Ordering::Acquire)
    }
}

impl fmt::Debug for TokioDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokioDispatcher")
            .field("max_requests", &self.max_requests)
            .field("running", &self.running_calls())
            .field("queued", &self.queued_calls())
            .finish_non_exhaustive()
    }
}

/// Holds one unit of a shared counter until dropped.
struct Counted(Arc<AtomicUsize>);

impl Counted {
    fn enter(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }

    fn get(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }
}

impl Drop for Counted {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl Dispatcher for TokioDispatcher {
    fn dispatch(&self, task: DispatchTask) {
        let permits = Arc::clone(&self.permits);
        let running = Arc::clone(&self.running);
        let queued = Arc::clone(&self.queued);

        let waiting = Counted::enter(queued);
        self.handle.spawn(async move {
            let permit = permits.acquire_owned().await;
            drop(waiting);

            let Ok(_permit) = permit else {
                // dropping the task lets its completion report the failure
                warn!("dispatcher is closed, dropping task");
                return;
            };

            // released on unwind too, when the task panics
            let running = Counted::enter(running);
            debug!(running = running.get(), "start dispatched task");
            task.await;
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use futures::channel::oneshot;

    use super::TokioDispatcher;
    use crate::dispatcher::Dispatcher;

    #[tokio::test]
    async fn runs_dispatched_tasks() {
        let dispatcher = TokioDispatcher::try_current(4).unwrap();
        let (tx, rx) = oneshot::channel();

        dispatcher.dispatch(Box::pin(async move {
            tx.send(7).unwrap();
        }));

        assert_eq!(rx.await.unwrap(), 7);
    }

    #[test]
    fn no_runtime_no_dispatcher() {
        assert!(TokioDispatcher::try_current(4).is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn bounds_concurrency() {
        let dispatcher = TokioDispatcher::try_current(1).unwrap();
        let peak = Arc::new(AtomicUsize::new(0));
        let current = Arc::new(AtomicUsize::new(0));
        let mut receivers = vec![];

        for _ in 0..4 {
            let (tx, rx) = oneshot::channel::<()>();
            receivers.push(rx);
            let peak = Arc::clone(&peak);
            let current = Arc::clone(&current);
            dispatcher.dispatch(Box::pin(async move {
                let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                current.fetch_sub(1, Ordering::SeqCst);
                let _ = tx.send(());
            }));
        }

        for rx in receivers {
            rx.await.unwrap();
        }
        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert_eq!(dispatcher.max_requests(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn panicking_task_releases_its_slot() {
        let dispatcher = TokioDispatcher::try_current(1).unwrap();

        fn blow_up() {
            panic!("transport blew up");
        }
        dispatcher.dispatch(Box::pin(async { blow_up() }));

        let (tx, rx) = oneshot::channel();
        dispatcher.dispatch(Box::pin(async move {
            tx.send(()).unwrap();
        }));
        tokio::time::timeout(Duration::from_secs(5), rx).await.unwrap().unwrap();

        for _ in 0..100 {
            if dispatcher.running_calls() == 0 && dispatcher.queued_calls() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        assert_eq!(dispatcher.running_calls(), 0);
        assert_eq!(dispatcher.queued_calls(), 0);
    }
}
