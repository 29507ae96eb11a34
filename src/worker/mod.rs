//! # POST worker
//!
//! [`PostWorker`] owns a [`BoundedQueue`] and a single background thread that
//! drains it. Any thread may [`submit`](PostWorker::submit) requests; the worker
//! executes them one at a time through a [`Transport`], updates the [`Stats`]
//! counters and reports each outcome to the completion callback.
//!
//! ## Lifecycle
//!
//! ```text
//! Stopped ──start()──▶ Starting ──▶ Running ──stop()──▶ Stopping ──▶ Stopped
//! ```
//!
//! The queue only exists while the worker runs. `stop()` drops whatever is still
//! queued without executing it, but lets a request that is already on the wire
//! finish, so it can take up to one request timeout to return. Counters survive
//! stop/start cycles.
//!
//! ## Policy
//!
//! Timeout, redirect limit, TLS verification and the callback can be changed at
//! any time. The worker reads them when it *starts* a record, so a change applies
//! to every record not yet started, including ones queued before the change.
//!
//! ```rust,no_run
//! use libiot_postqueue::network::tcp::TcpDialer;
//! use libiot_postqueue::transport::HttpTransport;
//! use libiot_postqueue::worker::PostWorker;
//!
//! let worker = PostWorker::new(HttpTransport::new(TcpDialer::new()));
//! worker.set_completion_callback(|ok, code, body| {
//!     println!("done: ok={} code={} body={}", ok, code, body);
//! });
//! assert!(worker.start());
//! worker.submit("http://192.168.1.10:8080/telemetry", r#"{"t":21.5}"#, false, None);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde::Serialize;

use crate::config::Config;
use crate::queue::{AllocError, BoundedQueue, RejectReason, RequestRecord};
use crate::transport::Transport;

mod execute;
mod policy;

pub use execute::{Outcome, execute, request_headers};
pub use policy::{Callback, ExecutionPolicy};

use policy::SharedPolicy;

/// Largest JSON document [`PostWorker::submit_json`] will serialize.
pub const MAX_JSON_LEN: usize = 2048;

const THREAD_NAME: &str = "post-queue-worker";

/// Aggregate outcome counters. `processed == successful + failed` always holds.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    /// Records executed, whatever the outcome.
    pub processed: u64,
    /// Records answered with a 2xx status.
    pub successful: u64,
    /// Records answered otherwise, or not answered at all.
    pub failed: u64,
}

impl Stats {
    fn record(&mut self, success: bool) {
        self.processed += 1;
        if success {
            self.successful += 1;
        } else {
            self.failed += 1;
        }
    }
}

/// Lifecycle of a [`PostWorker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// No thread, no queue.
    Stopped,
    /// Only visible while `start()` holds the lifecycle lock.
    Starting,
    /// The thread is draining the queue.
    Running,
    /// `stop()` is draining the queue and waiting for the thread.
    Stopping,
}

/// Why the worker could not be started.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum StartError {
    /// The queue could not be allocated.
    Allocation(AllocError),
    /// A previous worker thread panicked and took the transport with it.
    TransportUnavailable,
    /// The worker thread could not be spawned.
    Spawn,
    /// A previous `stop()` has not finished yet.
    Stopping,
}

/// Why a request was not queued.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SubmitError {
    /// The worker is stopped or stopping.
    NotRunning,
    /// The queue is at capacity.
    QueueFull,
    /// The target URL is empty.
    EmptyTarget,
    /// The JSON document did not fit [`MAX_JSON_LEN`].
    Serialize,
}

#[cfg(feature = "defmt")]
impl defmt::Format for StartError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            StartError::Allocation(e) => defmt::write!(f, "Allocation({})", e),
            StartError::TransportUnavailable => defmt::write!(f, "TransportUnavailable"),
            StartError::Spawn => defmt::write!(f, "Spawn"),
            StartError::Stopping => defmt::write!(f, "Stopping"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SubmitError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            SubmitError::NotRunning => defmt::write!(f, "NotRunning"),
            SubmitError::QueueFull => defmt::write!(f, "QueueFull"),
            SubmitError::EmptyTarget => defmt::write!(f, "EmptyTarget"),
            SubmitError::Serialize => defmt::write!(f, "Serialize"),
        }
    }
}

/// State reachable from both the owner and the worker thread.
#[derive(Debug)]
struct Shared {
    running: AtomicBool,
    policy: SharedPolicy,
    stats: Mutex<Stats>,
}

impl Shared {
    fn stats(&self) -> MutexGuard<'_, Stats> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug)]
struct Lifecycle<T> {
    state: WorkerState,
    queue: Option<Arc<BoundedQueue>>,
    thread: Option<JoinHandle<Option<T>>>,
    /// Parked here while stopped; owned by the thread while running.
    transport: Option<T>,
}

/// A bounded POST queue with one background worker thread.
///
/// All methods take `&self`, so the worker can be shared (e.g. in an `Arc`)
/// between the threads that submit requests and the one that controls it.
/// Dropping the worker stops it.
pub struct PostWorker<T: Transport + Send + 'static> {
    config: Config,
    shared: Arc<Shared>,
    lifecycle: Mutex<Lifecycle<T>>,
}

impl<T: Transport + Send + 'static> PostWorker<T> {
    /// A stopped worker with the default [`Config`].
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, Config::default())
    }

    /// A stopped worker. `config` seeds the execution policy.
    pub fn with_config(transport: T, config: Config) -> Self {
        Self {
            config,
            shared: Arc::new(Shared {
                running: AtomicBool::new(false),
                policy: SharedPolicy::new(ExecutionPolicy::from_config(&config)),
                stats: Mutex::new(Stats::default()),
            }),
            lifecycle: Mutex::new(Lifecycle {
                state: WorkerState::Stopped,
                queue: None,
                thread: None,
                transport: Some(transport),
            }),
        }
    }

    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle<T>> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn live_queue(&self) -> Option<Arc<BoundedQueue>> {
        let lifecycle = self.lifecycle();
        match lifecycle.state {
            WorkerState::Running => lifecycle.queue.clone(),
            _ => None,
        }
    }

    /// The construction-time configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Current lifecycle state.
    pub fn state(&self) -> WorkerState {
        self.lifecycle().state
    }

    /// `true` while submissions are accepted.
    pub fn is_running(&self) -> bool {
        self.state() == WorkerState::Running
    }

    /// Starts the worker. `true` if it is running afterwards.
    pub fn start(&self) -> bool {
        match self.try_start() {
            Ok(()) => true,
            Err(e) => {
                error!("failed to start worker: {:?}", e);
                false
            }
        }
    }

    /// Allocates the queue and spawns the worker thread.
    ///
    /// A no-op when already running. On failure nothing is left allocated and
    /// the worker stays stopped.
    pub fn try_start(&self) -> Result<(), StartError> {
        let mut lifecycle = self.lifecycle();
        match lifecycle.state {
            WorkerState::Running => return Ok(()),
            WorkerState::Stopping => return Err(StartError::Stopping),
            WorkerState::Stopped | WorkerState::Starting => {}
        }

        // A thread left behind by a stop() issued from its own callback.
        if let Some(handle) = lifecycle.thread.take() {
            if handle.thread().id() == thread::current().id() {
                lifecycle.thread = Some(handle);
                return Err(StartError::Stopping);
            }
            lifecycle.state = WorkerState::Stopping;
            drop(lifecycle);
            let transport = reap(handle);
            lifecycle = self.lifecycle();
            lifecycle.state = WorkerState::Stopped;
            if transport.is_some() {
                lifecycle.transport = transport;
            }
        }

        let queue = Arc::new(
            BoundedQueue::with_capacity(self.config.queue_capacity)
                .map_err(StartError::Allocation)?,
        );
        let transport = lifecycle
            .transport
            .take()
            .ok_or(StartError::TransportUnavailable)?;
        lifecycle.state = WorkerState::Starting;
        self.shared.running.store(true, Ordering::Release);

        let mut builder = thread::Builder::new().name(THREAD_NAME.into());
        if let Some(size) = self.config.stack_size {
            builder = builder.stack_size(size);
        }

        // The transport travels through a slot so it can be recovered if the
        // spawn fails after the closure has been moved into the builder.
        let slot = Arc::new(Mutex::new(Some(transport)));
        let spawned = {
            let slot = slot.clone();
            let queue = queue.clone();
            let shared = self.shared.clone();
            let poll = self.config.poll_interval();
            builder.spawn(move || {
                let transport = slot
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .take();
                drop(slot);
                transport.map(|t| run(t, &queue, &shared, poll))
            })
        };

        match spawned {
            Ok(handle) => {
                lifecycle.queue = Some(queue);
                lifecycle.thread = Some(handle);
                lifecycle.state = WorkerState::Running;
                info!("worker started, capacity {}", self.config.queue_capacity);
                Ok(())
            }
            Err(_) => {
                self.shared.running.store(false, Ordering::Release);
                lifecycle.transport = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
                lifecycle.state = WorkerState::Stopped;
                // `queue` is released here.
                Err(StartError::Spawn)
            }
        }
    }

    /// Stops the worker, dropping any queued records unexecuted.
    ///
    /// Blocks until a request already in flight has finished. A no-op when the
    /// worker is not running. Called from the completion callback it returns
    /// without waiting; the thread is joined by the next [`start`](Self::start).
    pub fn stop(&self) {
        let (queue, worker) = {
            let mut lifecycle = self.lifecycle();
            if lifecycle.state != WorkerState::Running {
                return;
            }
            lifecycle.state = WorkerState::Stopping;
            (lifecycle.queue.clone(), lifecycle.thread.take())
        };

        self.shared.running.store(false, Ordering::Release);
        if let Some(queue) = &queue {
            let dropped = queue.close();
            if dropped > 0 {
                info!("dropped {} queued requests", dropped);
            }
        }

        let (transport, parked) = match worker {
            // Called from the completion callback. The loop sees the cleared
            // flag once the callback returns; the next start() joins it.
            Some(handle) if handle.thread().id() == thread::current().id() => {
                debug!("stop requested from the worker thread");
                (None, Some(handle))
            }
            Some(handle) => (reap(handle), None),
            None => (None, None),
        };

        let mut lifecycle = self.lifecycle();
        lifecycle.thread = parked;
        if transport.is_some() {
            lifecycle.transport = transport;
        }
        lifecycle.queue = None;
        lifecycle.state = WorkerState::Stopped;
        info!("worker stopped");
    }

    /// Queues a POST. `false` if the worker is not running, the queue is full
    /// or the target is empty.
    pub fn submit(&self, target: &str, body: &str, use_tls: bool, headers: Option<&str>) -> bool {
        self.try_submit(target, body, use_tls, headers).is_ok()
    }

    /// Like [`submit`](Self::submit), but says why a record was refused.
    pub fn try_submit(
        &self,
        target: &str,
        body: &str,
        use_tls: bool,
        headers: Option<&str>,
    ) -> Result<(), SubmitError> {
        if target.is_empty() {
            return Err(SubmitError::EmptyTarget);
        }
        let queue = self.live_queue().ok_or(SubmitError::NotRunning)?;

        let record = RequestRecord::new(target, body, use_tls, headers);
        queue.try_enqueue(record).map_err(|rejected| {
            // The record is dropped with `rejected`.
            match rejected.reason {
                RejectReason::Full => {
                    warn!("queue full, rejecting post to {}", target);
                    SubmitError::QueueFull
                }
                RejectReason::Closed => SubmitError::NotRunning,
            }
        })
    }

    /// Serializes `document` to JSON and queues it.
    pub fn submit_json<S: Serialize>(
        &self,
        target: &str,
        document: &S,
        use_tls: bool,
        headers: Option<&str>,
    ) -> bool {
        self.try_submit_json(target, document, use_tls, headers)
            .is_ok()
    }

    /// Like [`submit_json`](Self::submit_json), but says why a record was refused.
    pub fn try_submit_json<S: Serialize>(
        &self,
        target: &str,
        document: &S,
        use_tls: bool,
        headers: Option<&str>,
    ) -> Result<(), SubmitError> {
        let mut buf = [0u8; MAX_JSON_LEN];
        let len = serde_json_core::to_slice(document, &mut buf).map_err(|_| SubmitError::Serialize)?;
        let body = core::str::from_utf8(&buf[..len]).map_err(|_| SubmitError::Serialize)?;
        self.try_submit(target, body, use_tls, headers)
    }

    /// Drops every queued record without executing it. Returns how many.
    pub fn clear(&self) -> usize {
        self.live_queue().map_or(0, |queue| queue.clear())
    }

    /// Records currently waiting. `0` when stopped.
    pub fn queue_size(&self) -> usize {
        self.live_queue().map_or(0, |queue| queue.len())
    }

    /// `true` when nothing is waiting, including when stopped.
    pub fn is_empty(&self) -> bool {
        self.queue_size() == 0
    }

    /// `false` when stopped.
    pub fn is_full(&self) -> bool {
        self.live_queue().is_some_and(|queue| queue.is_full())
    }

    /// A consistent snapshot of the counters.
    pub fn stats(&self) -> Stats {
        *self.shared.stats()
    }

    /// Current policy, as the next record would see it.
    pub fn policy(&self) -> ExecutionPolicy {
        self.shared.policy.snapshot()
    }

    /// Per-request timeout for records not yet started. Zero means none.
    pub fn set_timeout(&self, timeout: Duration) {
        self.shared.policy.update(|p| p.timeout = timeout);
    }

    /// `0` disables redirect following.
    pub fn set_max_redirects(&self, max_redirects: u8) {
        self.shared.policy.update(|p| p.max_redirects = max_redirects);
    }

    /// `false` skips certificate validation on secure requests.
    pub fn set_tls_verification(&self, verify: bool) {
        if !verify {
            warn!("tls certificate verification disabled");
        }
        self.shared.policy.update(|p| p.verify_tls = verify);
    }

    /// Installs the callback run on the worker thread after every record.
    ///
    /// Arguments are `(success, status_code, response_body)`; see [`Callback`].
    pub fn set_completion_callback<F>(&self, callback: F)
    where
        F: Fn(bool, i32, &str) + Send + Sync + 'static,
    {
        let callback: Arc<Callback> = Arc::new(callback);
        self.shared.policy.update(|p| p.callback = Some(callback));
    }

    /// Removes the completion callback.
    pub fn clear_completion_callback(&self) {
        self.shared.policy.update(|p| p.callback = None);
    }
}

impl<T: Transport + Send + 'static> Drop for PostWorker<T> {
    fn drop(&mut self) {
        self.stop();
    }
}

impl<T: Transport + Send + 'static> core::fmt::Debug for PostWorker<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PostWorker")
            .field("config", &self.config)
            .field("state", &self.state())
            .field("stats", &self.stats())
            .finish()
    }
}

/// Joins a finished worker thread and takes its transport back.
fn reap<T>(handle: JoinHandle<Option<T>>) -> Option<T> {
    match handle.join() {
        Ok(transport) => transport,
        Err(_) => {
            error!("worker thread panicked, transport lost");
            None
        }
    }
}

/// The worker thread. Returns the transport so a later `start()` can reuse it.
fn run<T: Transport>(
    mut transport: T,
    queue: &BoundedQueue,
    shared: &Shared,
    poll: Duration,
) -> T {
    debug!("worker thread running");
    while shared.running.load(Ordering::Acquire) {
        let Some(record) = queue.try_dequeue(poll) else {
            continue;
        };

        let policy = shared.policy.snapshot();
        debug!("posting to {}", record.target());
        let outcome = execute(&mut transport, &record, &policy);
        shared.stats().record(outcome.success);

        if outcome.success {
            info!("post ok, status {}", outcome.code);
        } else {
            warn!("post failed, status {}", outcome.code);
        }
        if let Some(callback) = &policy.callback {
            callback(outcome.success, outcome.code, outcome.body_text());
        }
        // `record` and `outcome` are released here, before the next dequeue.
    }
    debug!("worker thread exiting");
    transport
}
