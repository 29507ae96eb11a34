//! # libiot-postqueue
//!
//! A bounded HTTP POST queue for IoT devices. Application code hands JSON
//! payloads to a [`worker::PostWorker`] from any thread and moves on; a single
//! background worker sends them to the cloud one after the other and reports each
//! outcome through a callback and aggregate counters.
//!
//! ## Features
//!
//! ### Queueing
//! - Fixed capacity, non-blocking submission that fails fast when full
//! - Exactly one background worker, graceful start/stop, counters that survive restarts
//! - Policy (timeout, redirects, TLS verification, callback) applied per request
//!
//! ### Network
//! - **HTTP Client**: small HTTP/1.1 client over fixed-size buffers
//! - **Transport seam**: plug in any [`transport::Transport`] or [`network::Dialer`]
//! - **Header blocks**: lenient `Name: Value` parsing, Basic auth helper
//!
//! ## Usage
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! libiot-postqueue = "0.1.0"
//! ```
//!
//! ### Queueing telemetry
//!
//! ```rust,no_run
//! # #[cfg(feature = "std")] {
//! use libiot_postqueue::config::Config;
//! use libiot_postqueue::network::tcp::TcpDialer;
//! use libiot_postqueue::transport::HttpTransport;
//! use libiot_postqueue::worker::PostWorker;
//!
//! let config = Config::from_json(r#"{"queue_capacity":4,"timeout_ms":5000}"#).unwrap();
//! let worker = PostWorker::with_config(HttpTransport::new(TcpDialer::new()), config);
//! worker.start();
//!
//! let accepted = worker.submit(
//!     "http://gateway.local/api/readings",
//!     r#"{"sensor":"t1","value":22.4}"#,
//!     false,
//!     Some("X-Device-Id: 0042\nX-Fw: 1.3.0"),
//! );
//! if !accepted {
//!     // Queue full or worker stopped: keep the reading for later.
//! }
//! # }
//! ```
//!
//! ## Platform Support
//!
//! The HTTP client, header and URL helpers, transport seam and configuration
//! only need `core`. The queue and worker need threads and are available with
//! the `std` feature.
//!
//! ## Optional Features
//!
//! - `std`: Enable the queue, the worker and the `std::net` dialer (default: enabled)
//! - `log`: Emit diagnostics through the `log` facade (default: enabled)
//! - `defmt`: Emit diagnostics and format errors with defmt for embedded debugging

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

#[cfg(all(test, not(feature = "std")))]
extern crate std;

#[macro_use]
mod fmt;

/// Network abstraction layer: connection traits, connectors and the HTTP client.
pub mod network;

/// Worker configuration with defaults and JSON loading.
pub mod config;

/// The transport seam between the worker and the network.
pub mod transport;

/// Fixed-capacity FIFO of queued requests.
#[cfg(feature = "std")]
pub mod queue;

/// The background worker that drains the queue.
#[cfg(feature = "std")]
pub mod worker;
