//! Threaded decode backend.
//!
//! A pool of worker threads serves decode requests in submission order and
//! delivers each result as a [`DecodeOutcome`] on a channel drained by the
//! control thread. There is no per-request cancellation: superseded requests
//! run to completion and the control thread drops their results by generation.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use docview_cache::{Bitmap, BitmapContext, RecycleBatch};
use tracing::{trace, warn};

use crate::error::ScheduleError;
use crate::scheduler::{DecodeBackend, DecodeOutcome, DecodeRequest};

/// Decode callback run on a worker thread.
///
/// Receives the request and the shared bitmap context (to acquire a target
/// buffer from the pool). Returns `None` if the tile could not be decoded.
pub type DecodeFn = Arc<dyn Fn(&DecodeRequest, &BitmapContext) -> Option<Bitmap> + Send + Sync>;

/// Configuration for the decode worker pool.
#[derive(Debug, Clone)]
pub struct WorkerPoolConfig {
    /// Number of worker threads to spawn.
    /// Default: number of logical CPU cores.
    pub num_workers: usize,

    /// Maximum time a worker waits for a request before checking shutdown.
    /// Default: 100ms.
    pub poll_interval: Duration,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            num_workers: num_cpus(),
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl WorkerPoolConfig {
    /// Create a new worker pool configuration.
    pub fn new(num_workers: usize) -> Self {
        Self {
            num_workers: num_workers.max(1),
            poll_interval: Duration::from_millis(100),
        }
    }

    /// Set the poll interval for workers.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

#[derive(Default)]
struct RequestQueue {
    requests: Mutex<VecDeque<DecodeRequest>>,
    ready: Condvar,
}

impl RequestQueue {
    fn lock(&self) -> MutexGuard<'_, VecDeque<DecodeRequest>> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, request: DecodeRequest) {
        self.lock().push_back(request);
        self.ready.notify_one();
    }

    fn pop_timeout(&self, timeout: Duration) -> Option<DecodeRequest> {
        let mut requests = self.lock();
        if requests.is_empty() {
            requests = self
                .ready
                .wait_timeout(requests, timeout)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        requests.pop_front()
    }

    fn len(&self) -> usize {
        self.lock().len()
    }
}

/// Decode worker pool implementing [`DecodeBackend`].
///
/// # Example
///
/// ```
/// use docview_cache::{BitmapContext, BitmapPool, Generation};
/// use docview_scheduler::{
///     DecodeBackend, DecodeRequest, DecodeWorkerPool, TileId, ViewRect, WorkerPoolConfig,
/// };
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let context = BitmapContext::with_ram_pool(8);
/// let decode = Arc::new(|request: &DecodeRequest, context: &BitmapContext| {
///     Some(context.pool().acquire(request.width, request.height))
/// });
///
/// let (pool, outcomes) = DecodeWorkerPool::new(decode, context, WorkerPoolConfig::new(1)).unwrap();
/// pool.submit(DecodeRequest {
///     tile: TileId::root(0),
///     region: ViewRect::unit(),
///     zoom: 1.0,
///     width: 16,
///     height: 16,
///     generation: Generation::new(0),
/// });
///
/// let outcome = outcomes.recv_timeout(Duration::from_secs(5)).unwrap();
/// assert!(outcome.bitmap.is_some());
/// pool.shutdown();
/// ```
pub struct DecodeWorkerPool {
    queue: Arc<RequestQueue>,
    workers: Vec<Worker>,
    shutdown: Arc<AtomicBool>,
}

impl DecodeWorkerPool {
    /// Create and start a new worker pool.
    ///
    /// Returns the pool and the receiving end of the outcome channel.
    ///
    /// # Errors
    /// [`ScheduleError::Spawn`] if a worker thread cannot be started.
    pub fn new(
        decode: DecodeFn,
        context: BitmapContext,
        config: WorkerPoolConfig,
    ) -> Result<(Self, Receiver<DecodeOutcome>), ScheduleError> {
        let (sender, receiver) = mpsc::channel();
        let queue = Arc::new(RequestQueue::default());
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut pool = Self {
            queue,
            workers: Vec::with_capacity(config.num_workers),
            shutdown,
        };

        for id in 0..config.num_workers {
            let worker = Worker::spawn(
                id,
                WorkerShared {
                    queue: pool.queue.clone(),
                    decode: decode.clone(),
                    context: context.clone(),
                    outcomes: sender.clone(),
                    shutdown: pool.shutdown.clone(),
                    poll_interval: config.poll_interval,
                },
            )?;
            pool.workers.push(worker);
        }

        Ok((pool, receiver))
    }

    /// Get the number of worker threads.
    pub fn num_workers(&self) -> usize {
        self.workers.len()
    }

    /// Requests waiting for a worker
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Check if the worker pool is shutting down.
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Shutdown the worker pool gracefully.
    ///
    /// Signals all workers to stop and waits for them to finish their current
    /// request. Queued requests that were not started are discarded.
    pub fn shutdown(mut self) {
        self.signal_shutdown();
        for worker in std::mem::take(&mut self.workers) {
            worker.join();
        }
    }

    fn signal_shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
        self.queue.ready.notify_all();
    }
}

impl DecodeBackend for DecodeWorkerPool {
    fn submit(&self, request: DecodeRequest) {
        if self.is_shutting_down() {
            warn!(tile = ?request.tile, "decode submitted after shutdown; dropped");
            return;
        }
        self.queue.push(request);
    }
}

impl Drop for DecodeWorkerPool {
    fn drop(&mut self) {
        // Workers exit on their next poll; no join here
        self.signal_shutdown();
    }
}

struct WorkerShared {
    queue: Arc<RequestQueue>,
    decode: DecodeFn,
    context: BitmapContext,
    outcomes: Sender<DecodeOutcome>,
    shutdown: Arc<AtomicBool>,
    poll_interval: Duration,
}

/// A single worker thread in the pool.
struct Worker {
    id: usize,
    thread: Option<JoinHandle<()>>,
}

impl Worker {
    fn spawn(id: usize, shared: WorkerShared) -> Result<Self, ScheduleError> {
        let thread = thread::Builder::new()
            .name(format!("docview-decode-{}", id))
            .spawn(move || Self::run(shared))?;

        Ok(Self {
            id,
            thread: Some(thread),
        })
    }

    /// Main worker loop.
    fn run(shared: WorkerShared) {
        while !shared.shutdown.load(Ordering::Acquire) {
            let Some(request) = shared.queue.pop_timeout(shared.poll_interval) else {
                continue;
            };

            let bitmap = (shared.decode)(&request, &shared.context);
            trace!(tile = ?request.tile, decoded = bitmap.is_some(), "decode finished");

            if let Err(mpsc::SendError(outcome)) = shared.outcomes.send(DecodeOutcome { request, bitmap }) {
                // Nobody is listening any more; give the pixels back
                if let Some(bitmap) = outcome.bitmap {
                    let mut batch = RecycleBatch::new();
                    batch.push(bitmap);
                    shared.context.release(batch);
                }
                break;
            }
        }
    }

    /// Wait for the worker thread to finish.
    fn join(mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!(worker = self.id, "decode worker panicked");
            }
        }
    }
}

/// Get the number of logical CPU cores.
fn num_cpus() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}
