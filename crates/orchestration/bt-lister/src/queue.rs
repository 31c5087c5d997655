//! Bounded work queue.
//!
//! A FIFO task queue processed by at most `concurrency` tokio tasks. Handlers
//! receive the queue itself so they can enqueue follow-up work. Completion is
//! reported through a one-shot [`Drained`] future created together with the
//! queue, so every run gets its own completion signal.

use async_trait::async_trait;
use bt_error::{BtError, Result};
use futures::FutureExt;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tokio::sync::oneshot;
use tracing::{debug, trace};

/// Default number of concurrently running tasks.
pub const DEFAULT_CONCURRENCY: usize = 15;

/// Executes one task; may enqueue more through `queue`.
#[async_trait]
pub trait TaskHandler<T: Send + 'static>: Send + Sync + 'static {
    /// Process one task.
    async fn handle(&self, task: T, queue: &WorkQueue<T>) -> Result<()>;
}

/// Statistics for the work queue.
#[derive(Debug, Default)]
pub struct QueueStats {
    /// Tasks accepted by `enqueue`
    pub enqueued: AtomicU64,

    /// Tasks that finished (successfully or not)
    pub completed: AtomicU64,

    /// Tasks dropped because the run had already failed
    pub discarded: AtomicU64,

    /// Highest number of simultaneously running tasks
    pub peak_in_flight: AtomicUsize,
}

impl QueueStats {
    /// Tasks accepted so far.
    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    /// Tasks finished so far.
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    /// Tasks dropped after a failure.
    pub fn discarded(&self) -> u64 {
        self.discarded.load(Ordering::Relaxed)
    }

    /// Highest observed concurrency.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::Relaxed)
    }
}

struct QueueState<T> {
    pending: VecDeque<T>,
    in_flight: usize,
    failure: Option<BtError>,
    completion: Option<oneshot::Sender<Result<()>>>,
}

struct Inner<T: Send + 'static> {
    concurrency: usize,
    handler: Arc<dyn TaskHandler<T>>,
    state: Mutex<QueueState<T>>,
    stats: Arc<QueueStats>,
}

/// Handle to a bounded FIFO work queue.
///
/// Cloning the handle is cheap; all clones feed the same queue.
pub struct WorkQueue<T: Send + 'static> {
    inner: Arc<Inner<T>>,
}

impl<T: Send + 'static> Clone for WorkQueue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Resolves once the queue is empty and idle.
///
/// Yields the first task failure, if any.
pub struct Drained {
    receiver: oneshot::Receiver<Result<()>>,
}

impl Drained {
    /// Wait for the queue to drain.
    pub async fn wait(self) -> Result<()> {
        self.receiver.await.map_err(|_| {
            BtError::Pipeline("work queue dropped before draining".to_string())
        })?
    }
}

impl<T: Send + 'static> WorkQueue<T> {
    /// Create a queue running at most `concurrency` tasks at once.
    ///
    /// Must be called inside a tokio runtime; tasks are spawned onto it.
    pub fn new(concurrency: usize, handler: Arc<dyn TaskHandler<T>>) -> (Self, Drained) {
        let (sender, receiver) = oneshot::channel();
        let queue = Self {
            inner: Arc::new(Inner {
                concurrency: concurrency.max(1),
                handler,
                state: Mutex::new(QueueState {
                    pending: VecDeque::new(),
                    in_flight: 0,
                    failure: None,
                    completion: Some(sender),
                }),
                stats: Arc::new(QueueStats::default()),
            }),
        };
        (queue, Drained { receiver })
    }

    /// Add a task.
    ///
    /// Starts it immediately when under the concurrency ceiling, otherwise
    /// queues it behind earlier tasks. Tasks enqueued after a failure are
    /// discarded. Enqueueing into a drained queue is an error.
    pub fn enqueue(&self, task: T) -> Result<()> {
        let mut state = self.inner.state.lock();

        if state.completion.is_none() {
            return Err(BtError::Pipeline(
                "work queue already drained".to_string(),
            ));
        }

        if state.failure.is_some() {
            self.inner.stats.discarded.fetch_add(1, Ordering::Relaxed);
            trace!("Discarding task enqueued after failure");
            return Ok(());
        }

        self.inner.stats.enqueued.fetch_add(1, Ordering::Relaxed);

        if state.in_flight < self.inner.concurrency {
            state.in_flight += 1;
            self.inner
                .stats
                .peak_in_flight
                .fetch_max(state.in_flight, Ordering::Relaxed);
            drop(state);
            self.spawn(task);
        } else {
            state.pending.push_back(task);
        }

        Ok(())
    }

    /// Queue statistics.
    pub fn stats(&self) -> Arc<QueueStats> {
        Arc::clone(&self.inner.stats)
    }

    /// Run `task` and then keep pulling pending tasks on the same worker.
    fn spawn(&self, task: T) {
        let queue = self.clone();

        tokio::spawn(async move {
            let mut next = Some(task);
            while let Some(task) = next.take() {
                let handler = Arc::clone(&queue.inner.handler);
                let outcome = AssertUnwindSafe(handler.handle(task, &queue))
                    .catch_unwind()
                    .await;

                let result = outcome.unwrap_or_else(|_| {
                    Err(BtError::Pipeline("queue worker panicked".to_string()))
                });
                next = queue.finish(result);
            }
        });
    }

    /// Record a finished task and hand back the next one for this worker.
    fn finish(&self, result: Result<()>) -> Option<T> {
        self.inner.stats.completed.fetch_add(1, Ordering::Relaxed);
        let mut state = self.inner.state.lock();

        if let Err(error) = result {
            if state.failure.is_none() {
                let dropped = state.pending.len();
                debug!(error = %error, dropped, "Task failed, discarding pending tasks");
                self.inner
                    .stats
                    .discarded
                    .fetch_add(dropped as u64, Ordering::Relaxed);
                state.pending.clear();
                state.failure = Some(error);
            } else {
                debug!(error = %error, "Additional task failure after run failed");
            }
        }

        if let Some(next) = state.pending.pop_front() {
            return Some(next);
        }

        state.in_flight -= 1;

        if state.in_flight == 0 {
            if let Some(completion) = state.completion.take() {
                let outcome = match state.failure.take() {
                    Some(error) => Err(error),
                    None => Ok(()),
                };
                let _ = completion.send(outcome);
            }
        }

        None
    }
}
