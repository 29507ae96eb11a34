//! # Bounded request queue
//!
//! A fixed-capacity FIFO that moves [`RequestRecord`]s from any number of
//! producers to a single consumer. Records travel by value: a record belongs to
//! the caller until [`BoundedQueue::try_enqueue`] accepts it, to the queue while
//! it waits, and to the consumer once [`BoundedQueue::try_dequeue`] hands it out.
//! Nothing in the queue knows about HTTP.
//!
//! The consumer waits on a condition variable, so an idle worker costs nothing
//! and a [`close`](BoundedQueue::close) wakes it immediately.
//!
//! ```rust
//! use std::time::Duration;
//! use libiot_postqueue::queue::{BoundedQueue, RequestRecord};
//!
//! let queue = BoundedQueue::with_capacity(2).unwrap();
//! queue.try_enqueue(RequestRecord::new("http://a/", "{}", false, None)).unwrap();
//! queue.try_enqueue(RequestRecord::new("http://b/", "{}", false, None)).unwrap();
//!
//! // Full: the record comes back to the caller.
//! let rejected = queue
//!     .try_enqueue(RequestRecord::new("http://c/", "{}", false, None))
//!     .unwrap_err();
//! assert_eq!(rejected.record.target(), "http://c/");
//!
//! let first = queue.try_dequeue(Duration::from_millis(10)).unwrap();
//! assert_eq!(first.target(), "http://a/");
//! ```

use std::collections::{TryReserveError, VecDeque};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// One queued POST request.
///
/// Fields are private: once built a record is never modified, only moved.
#[derive(Debug, PartialEq, Eq)]
pub struct RequestRecord {
    target: String,
    body: String,
    headers: Option<String>,
    use_tls: bool,
    enqueued_at: Instant,
}

impl RequestRecord {
    /// Builds a record, copying the caller's strings.
    pub fn new(target: &str, body: &str, use_tls: bool, headers: Option<&str>) -> Self {
        Self {
            target: target.into(),
            body: body.into(),
            headers: headers.map(Into::into),
            use_tls,
            enqueued_at: Instant::now(),
        }
    }

    /// The destination URL.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// The pre-serialized payload.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// The raw `Name: Value` header block, if any.
    pub fn headers(&self) -> Option<&str> {
        self.headers.as_deref()
    }

    /// Whether the record asks for a secure connection.
    pub fn use_tls(&self) -> bool {
        self.use_tls
    }

    /// When the record was built. Diagnostic only.
    pub fn enqueued_at(&self) -> Instant {
        self.enqueued_at
    }
}

/// Why [`BoundedQueue::try_enqueue`] refused a record.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RejectReason {
    /// Occupancy equals capacity.
    Full,
    /// The queue has been closed by its owner.
    Closed,
}

/// A refused record, handed back to the caller.
#[derive(Debug, PartialEq, Eq)]
pub struct Rejected {
    /// Why the record was refused.
    pub reason: RejectReason,
    /// The record, unchanged.
    pub record: RequestRecord,
}

/// The queue storage could not be set up.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum AllocError {
    /// A queue must hold at least one record.
    ZeroCapacity,
    /// The allocator refused the buffer.
    OutOfMemory,
}

impl From<TryReserveError> for AllocError {
    fn from(_: TryReserveError) -> Self {
        AllocError::OutOfMemory
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for RejectReason {
    fn format(&self, f: defmt::Formatter) {
        match self {
            RejectReason::Full => defmt::write!(f, "Full"),
            RejectReason::Closed => defmt::write!(f, "Closed"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for AllocError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            AllocError::ZeroCapacity => defmt::write!(f, "ZeroCapacity"),
            AllocError::OutOfMemory => defmt::write!(f, "OutOfMemory"),
        }
    }
}

#[derive(Debug)]
struct Slots {
    records: VecDeque<RequestRecord>,
    closed: bool,
}

/// Fixed-capacity, multi-producer single-consumer FIFO of [`RequestRecord`]s.
#[derive(Debug)]
pub struct BoundedQueue {
    capacity: usize,
    slots: Mutex<Slots>,
    available: Condvar,
}

impl BoundedQueue {
    /// Allocates storage for exactly `capacity` records up front.
    pub fn with_capacity(capacity: usize) -> Result<Self, AllocError> {
        if capacity == 0 {
            return Err(AllocError::ZeroCapacity);
        }
        let mut records = VecDeque::new();
        records.try_reserve_exact(capacity)?;
        Ok(Self {
            capacity,
            slots: Mutex::new(Slots {
                records,
                closed: false,
            }),
            available: Condvar::new(),
        })
    }

    // A panic while holding the lock cannot leave `Slots` half-updated, so a
    // poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fixed at construction.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Adds a record to the tail without blocking.
    ///
    /// Fails when the queue is full or closed; the record is returned inside the
    /// error so the caller decides what happens to it.
    pub fn try_enqueue(&self, record: RequestRecord) -> Result<(), Rejected> {
        let mut slots = self.lock();
        let reason = if slots.closed {
            RejectReason::Closed
        } else if slots.records.len() >= self.capacity {
            RejectReason::Full
        } else {
            slots.records.push_back(record);
            drop(slots);
            self.available.notify_one();
            return Ok(());
        };
        Err(Rejected { reason, record })
    }

    /// Takes the head record, waiting up to `timeout` for one to arrive.
    ///
    /// Returns `None` on timeout or once the queue is closed.
    pub fn try_dequeue(&self, timeout: Duration) -> Option<RequestRecord> {
        let slots = self.lock();
        let (mut slots, _) = self
            .available
            .wait_timeout_while(slots, timeout, |s| s.records.is_empty() && !s.closed)
            .unwrap_or_else(PoisonError::into_inner);
        if slots.closed {
            return None;
        }
        slots.records.pop_front()
    }

    /// Current occupancy. May be stale as soon as it returns.
    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    /// Snapshot, like [`len`](Self::len).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot: a producer may still be refused after a `false`.
    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    /// `true` once [`close`](Self::close) has run.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Drops every queued record without executing it and returns how many were
    /// dropped. Records enqueued while this runs may or may not be drained.
    pub fn clear(&self) -> usize {
        let mut slots = self.lock();
        let dropped = slots.records.len();
        // Keeps the reserved buffer.
        slots.records.clear();
        dropped
    }

    /// Refuses further records, drops the queued ones and wakes the consumer.
    pub fn close(&self) -> usize {
        self.lock().closed = true;
        self.available.notify_all();
        self.clear()
    }
}
