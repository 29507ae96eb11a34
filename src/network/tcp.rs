use std::io::{ErrorKind, Read as StdRead, Write as StdWrite};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};

use super::error::Error;
use super::{Close, Connection, Dial, Dialer, Read, Write};

/// A [`Connection`] over a blocking `std::net::TcpStream`.
#[derive(Debug)]
pub struct TcpConnection {
    stream: TcpStream,
}

impl TcpConnection {
    /// Wraps an already connected stream.
    pub fn new(stream: TcpStream) -> Self {
        Self { stream }
    }
}

fn map_io(e: std::io::Error, fallback: Error) -> Error {
    match e.kind() {
        ErrorKind::WouldBlock | ErrorKind::TimedOut => Error::Timeout,
        ErrorKind::ConnectionRefused => Error::ConnectionRefused,
        ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted | ErrorKind::BrokenPipe => {
            Error::ConnectionClosed
        }
        ErrorKind::NotConnected => Error::NotOpen,
        _ => fallback,
    }
}

impl Read for TcpConnection {
    type Error = Error;
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.stream.read(buf).map_err(|e| map_io(e, Error::ReadError))
    }
}

impl Write for TcpConnection {
    type Error = Error;
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.stream.write(buf).map_err(|e| map_io(e, Error::WriteError))
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.stream.flush().map_err(|e| map_io(e, Error::WriteError))
    }
}

impl Close for TcpConnection {
    type Error = Error;
    fn close(self) -> Result<(), Self::Error> {
        // The peer may already have hung up after sending the response.
        match self.stream.shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(map_io(e, Error::ConnectionClosed)),
        }
    }
}

impl Connection for TcpConnection {}

/// Opens plain TCP connections with `std::net`.
///
/// Secure dials are refused with [`Error::TlsUnavailable`]; devices that need
/// TLS provide a [`Dialer`] wrapping their platform TLS stack.
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpDialer;

impl TcpDialer {
    pub fn new() -> Self {
        Self
    }
}

impl Dialer for TcpDialer {
    type Connection = TcpConnection;

    fn dial(&mut self, dial: &Dial<'_>) -> Result<Self::Connection, Error> {
        if dial.secure {
            return Err(Error::TlsUnavailable);
        }

        let addrs = (dial.host, dial.port)
            .to_socket_addrs()
            .map_err(|_| Error::InvalidAddress)?;

        // A zero timeout means no timeout; std rejects zero durations.
        let timeout = Some(dial.timeout).filter(|t| !t.is_zero());

        let mut last = Error::InvalidAddress;
        for addr in addrs {
            let connected = match timeout {
                Some(t) => TcpStream::connect_timeout(&addr, t),
                None => TcpStream::connect(addr),
            };
            match connected {
                Ok(stream) => {
                    stream
                        .set_read_timeout(timeout)
                        .map_err(|_| Error::InvalidAddress)?;
                    stream
                        .set_write_timeout(timeout)
                        .map_err(|_| Error::InvalidAddress)?;
                    return Ok(TcpConnection::new(stream));
                }
                Err(e) => last = map_io(e, Error::ConnectionRefused),
            }
        }
        Err(last)
    }
}
