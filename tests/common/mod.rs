#![allow(dead_code)]

use libiot_postqueue::network::error::Error;
use libiot_postqueue::transport::{PostRequest, Reply, Transport};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

/// What a transport was asked to do, copied out of the borrowed request.
#[derive(Debug, Clone, PartialEq)]
pub struct Seen {
    pub target: String,
    pub body: String,
    pub headers: Vec<(String, String)>,
    pub secure: bool,
    pub verify_tls: bool,
    pub timeout: Duration,
    pub max_redirects: u8,
    pub thread: ThreadId,
}

impl Seen {
    fn of(request: &PostRequest<'_>) -> Self {
        Self {
            target: request.target.to_string(),
            body: request.body.to_string(),
            headers: request
                .headers
                .iter()
                .map(|h| (h.name.to_string(), h.value.to_string()))
                .collect(),
            secure: request.secure,
            verify_tls: request.verify_tls,
            timeout: request.timeout,
            max_redirects: request.max_redirects,
            thread: thread::current().id(),
        }
    }
}

pub type SeenLog = Arc<Mutex<Vec<Seen>>>;

/// Answers from a script, then with `200 ok` once the script runs out.
pub struct Scripted {
    script: VecDeque<Result<Reply, Error>>,
    seen: SeenLog,
    delay: Duration,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl Scripted {
    pub fn new(script: Vec<Result<Reply, Error>>) -> (Self, SeenLog) {
        let seen = SeenLog::default();
        (
            Self {
                script: script.into(),
                seen: seen.clone(),
                delay: Duration::ZERO,
                in_flight: Arc::default(),
                max_in_flight: Arc::default(),
            },
            seen,
        )
    }

    pub fn ok() -> (Self, SeenLog) {
        Self::new(Vec::new())
    }

    /// Sleeps this long inside every post.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn max_in_flight(&self) -> Arc<AtomicUsize> {
        self.max_in_flight.clone()
    }
}

impl Transport for Scripted {
    fn post(&mut self, request: &PostRequest<'_>) -> Result<Reply, Error> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.seen.lock().unwrap().push(Seen::of(request));
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.script
            .pop_front()
            .unwrap_or_else(|| Ok(Reply::new(200, b"ok")))
    }
}

/// A transport that stalls inside every post until the test lets it through.
pub struct Gated {
    started: Sender<String>,
    permits: Receiver<()>,
    open: Arc<AtomicBool>,
    seen: SeenLog,
}

pub struct Gate {
    started: Receiver<String>,
    permits: Sender<()>,
    open: Arc<AtomicBool>,
    pub seen: SeenLog,
}

pub fn gated() -> (Gated, Gate) {
    let (started_tx, started_rx) = mpsc::channel();
    let (permit_tx, permit_rx) = mpsc::channel();
    let open = Arc::new(AtomicBool::new(false));
    let seen = SeenLog::default();
    (
        Gated {
            started: started_tx,
            permits: permit_rx,
            open: open.clone(),
            seen: seen.clone(),
        },
        Gate {
            started: started_rx,
            permits: permit_tx,
            open,
            seen,
        },
    )
}

impl Transport for Gated {
    fn post(&mut self, request: &PostRequest<'_>) -> Result<Reply, Error> {
        self.seen.lock().unwrap().push(Seen::of(request));
        let _ = self.started.send(request.target.to_string());

        // Bounded so a forgotten release cannot hang the test binary.
        let deadline = Instant::now() + Duration::from_secs(10);
        while !self.open.load(Ordering::SeqCst) && Instant::now() < deadline {
            match self.permits.recv_timeout(Duration::from_millis(20)) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {}
            }
        }
        Ok(Reply::new(200, b"ok"))
    }
}

impl Gate {
    /// Waits until the worker is stalled inside a post and returns its target.
    pub fn wait_started(&self) -> String {
        self.started
            .recv_timeout(Duration::from_secs(5))
            .expect("worker never started a request")
    }

    /// Lets one stalled post finish.
    pub fn release(&self) {
        self.permits.send(()).unwrap();
    }

    /// Stops stalling altogether.
    pub fn open(&self) {
        self.open.store(true, Ordering::SeqCst);
        let _ = self.permits.send(());
    }
}

/// Polls `cond` until it holds or five seconds pass.
pub fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    cond()
}
