//! Worker configuration.
//!
//! All values have firmware-friendly defaults, so a device usually only overrides
//! a field or two, either in code or from a JSON blob kept in flash.

use core::time::Duration;

use serde::{Deserialize, Serialize};

/// Default for [`Config::queue_capacity`].
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;
/// Default for [`Config::timeout_ms`].
pub const DEFAULT_TIMEOUT_MS: u32 = 10_000;
/// Default for [`Config::max_redirects`].
pub const DEFAULT_MAX_REDIRECTS: u8 = 5;
/// Default for [`Config::poll_interval_ms`].
pub const DEFAULT_POLL_INTERVAL_MS: u32 = 100;
/// Lower bound on the idle wait, so an idle worker never spins.
pub const MIN_POLL_INTERVAL_MS: u32 = 1;

/// Construction-time settings of a [`PostWorker`](crate::worker::PostWorker).
///
/// `timeout_ms`, `max_redirects` and `verify_tls` only seed the execution policy;
/// they can be changed later through the worker's setters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum number of queued requests.
    pub queue_capacity: usize,
    /// Per-request timeout in milliseconds, `0` for none.
    pub timeout_ms: u32,
    /// Redirect hops to follow, `0` to disable.
    pub max_redirects: u8,
    /// Validate server certificates on secure requests.
    pub verify_tls: bool,
    /// How long the worker waits for a record before re-checking for shutdown.
    /// Values below 1 ms are treated as 1 ms.
    pub poll_interval_ms: u32,
    /// Stack size of the worker thread in bytes, platform default when `None`.
    pub stack_size: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            verify_tls: true,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            stack_size: None,
        }
    }
}

impl Config {
    /// Defaults with a different queue capacity.
    pub fn with_capacity(queue_capacity: usize) -> Self {
        Self {
            queue_capacity,
            ..Self::default()
        }
    }

    /// Loads a configuration from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json_core::de::Error> {
        serde_json_core::from_str(json).map(|(config, _)| config)
    }

    /// The per-request timeout. Zero means no timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.timeout_ms))
    }

    /// The worker's idle wait. Never shorter than [`MIN_POLL_INTERVAL_MS`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.poll_interval_ms.max(MIN_POLL_INTERVAL_MS)))
    }
}
