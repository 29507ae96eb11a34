use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::config::Config;

/// Completion callback: `(success, status_code, response_body)`.
///
/// Runs on the worker thread. `status_code` is the HTTP status when the server
/// answered and a negative transport code otherwise, in which case the body is
/// empty.
pub type Callback = dyn Fn(bool, i32, &str) + Send + Sync + 'static;

/// The settings applied to a record when the worker starts executing it.
#[derive(Clone)]
pub struct ExecutionPolicy {
    /// Per-request timeout, zero for none.
    pub timeout: Duration,
    /// `0` disables redirect following.
    pub max_redirects: u8,
    /// Validate server certificates on secure requests.
    pub verify_tls: bool,
    /// Called after every record with its outcome.
    pub callback: Option<Arc<Callback>>,
}

impl ExecutionPolicy {
    /// The policy a fresh worker starts with: no callback.
    pub fn from_config(config: &Config) -> Self {
        Self {
            timeout: config.timeout(),
            max_redirects: config.max_redirects,
            verify_tls: config.verify_tls,
            callback: None,
        }
    }
}

impl core::fmt::Debug for ExecutionPolicy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ExecutionPolicy")
            .field("timeout", &self.timeout)
            .field("max_redirects", &self.max_redirects)
            .field("verify_tls", &self.verify_tls)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

/// Policy shared between the setters and the worker thread.
///
/// The worker takes a [`snapshot`](SharedPolicy::snapshot) per record, so a
/// change never alters a request that is already running.
#[derive(Debug)]
pub(crate) struct SharedPolicy {
    inner: Mutex<ExecutionPolicy>,
}

impl SharedPolicy {
    pub(crate) fn new(policy: ExecutionPolicy) -> Self {
        Self {
            inner: Mutex::new(policy),
        }
    }

    pub(crate) fn snapshot(&self) -> ExecutionPolicy {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn update(&self, f: impl FnOnce(&mut ExecutionPolicy)) {
        f(&mut self.inner.lock().unwrap_or_else(PoisonError::into_inner));
    }
}
