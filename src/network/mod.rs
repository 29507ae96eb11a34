//! A network abstraction layer for embedded systems
//!
//! This module provides the byte-stream traits the HTTP client is written against,
//! plus the [`Dialer`] seam through which the transport opens plain or secure
//! connections. Platforms plug in their own TCP/TLS stacks by implementing these
//! traits; the `std` feature ships a plain TCP [`tcp::TcpDialer`].

#![allow(missing_docs)]
#![deny(unsafe_code)]

use core::time::Duration;

/// Common error types for network operations
pub mod error;

/// Application layer protocols built on top of [`Connection`].
pub mod application;

/// Plain TCP connector backed by `std::net`.
#[cfg(feature = "std")]
pub mod tcp;

/// Re-exports of common traits
pub mod prelude {
    pub use super::{Close, Connection, Dialer, Read, Stream, Write};
}

pub trait Read {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Read data from the connection
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

pub trait Write {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Write data to the connection
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error>;
    /// Flush the write buffer
    fn flush(&mut self) -> Result<(), Self::Error>;
}

pub trait Close {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Close the connection
    fn close(self) -> Result<(), Self::Error>;
}

/// A synchronous connection
pub trait Connection: Read + Write + Close {}

/// A connection whose reads and writes report [`error::Error`], so timeouts and
/// resets keep their meaning all the way up to the transport.
pub trait Stream: Connection + Read<Error = error::Error> + Write<Error = error::Error> {}

impl<T> Stream for T where T: Connection + Read<Error = error::Error> + Write<Error = error::Error> {}

/// Everything a connector needs to know to open one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dial<'a> {
    /// Host name or address literal, without port.
    pub host: &'a str,
    pub port: u16,
    /// Wrap the stream in TLS.
    pub secure: bool,
    /// Validate the server certificate chain. Only meaningful when `secure` is set;
    /// `false` is an explicit insecure mode.
    pub verify_tls: bool,
    /// Applied to connect, read and write. Zero disables the timeout.
    pub timeout: Duration,
}

/// Opens connections for the HTTP transport.
///
/// A dialer is asked for a fresh connection per request and per redirect hop.
pub trait Dialer {
    /// Associated connection type
    type Connection: Stream;
    /// Open a connection described by `dial`.
    fn dial(&mut self, dial: &Dial<'_>) -> Result<Self::Connection, error::Error>;
}
