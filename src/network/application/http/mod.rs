//! HTTP/1.1 protocol implementation for embedded systems.
//!
//! This module provides a lightweight HTTP client designed for embedded systems and
//! `no_std` environments. It focuses on simplicity, predictable memory usage, and
//! compatibility with resource-constrained devices.
//!
//! # Features
//!
//! - HTTP/1.1 request/response over any [`crate::network::Stream`]
//! - Fixed-size buffers; oversized response bodies are truncated, not rejected
//! - `Content-Length`, chunked and close-delimited response bodies
//! - Lenient parsing of `Name: Value` header blocks
//! - URL splitting and redirect `Location` resolution
//!
//! # Usage
//!
//! ```rust,no_run
//! use libiot_postqueue::network::application::http::client::{Client, Method, Request};
//! use libiot_postqueue::network::application::http::headers;
//! # use libiot_postqueue::network::{Close, Connection, Read, Write};
//! # use libiot_postqueue::network::error::Error;
//! # struct MockConnection;
//! # impl Connection for MockConnection {}
//! # impl Read for MockConnection {
//! #     type Error = Error;
//! #     fn read(&mut self, _buf: &mut [u8]) -> Result<usize, Self::Error> { Ok(0) }
//! # }
//! # impl Write for MockConnection {
//! #     type Error = Error;
//! #     fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> { Ok(buf.len()) }
//! #     fn flush(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//! # impl Close for MockConnection {
//! #     type Error = Error;
//! #     fn close(self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//!
//! let mut client = Client::new(MockConnection);
//! let headers = headers::parse_block("Content-Type: application/json\nX-Device: 42");
//!
//! let request = Request {
//!     method: Method::Post,
//!     host: "api.example.com",
//!     path: "/telemetry",
//!     headers: &headers,
//!     body: Some(br#"{"t":23.5}"#),
//! };
//!
//! // let response = client.request(&request)?;
//! ```

/// HTTP client implementation and supporting types.
pub mod client;

/// Parsing of newline-separated custom header blocks.
pub mod headers;

/// Target URL parsing and redirect resolution.
pub mod url;

pub use client::{Client, Header, Headers, Method, Request, Response};
