//! Scripted dialer and connection for exercising the HTTP transport offline.

use libiot_postqueue::network::error::Error;
use libiot_postqueue::network::{Close, Connection, Dial, Dialer, Read, Write};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One dial as the transport requested it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialed {
    pub host: String,
    pub port: u16,
    pub secure: bool,
    pub verify_tls: bool,
    pub timeout: Duration,
}

/// Bytes written to each connection, in dial order.
pub type Wire = Arc<Mutex<Vec<Vec<u8>>>>;

/// Serves a canned response and captures what the client sends.
#[derive(Debug)]
pub struct MockConnection {
    response: Vec<u8>,
    read_pos: usize,
    /// Largest read handed out at once, to exercise partial reads.
    read_step: usize,
    wire: Wire,
    slot: usize,
}

impl Read for MockConnection {
    type Error = Error;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let remaining = self.response.len() - self.read_pos;
        let n = buf.len().min(remaining).min(self.read_step);
        buf[..n].copy_from_slice(&self.response[self.read_pos..self.read_pos + n]);
        self.read_pos += n;
        Ok(n)
    }
}

impl Write for MockConnection {
    type Error = Error;

    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.wire.lock().unwrap()[self.slot].extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Close for MockConnection {
    type Error = Error;

    fn close(self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Connection for MockConnection {}

/// Hands out one scripted connection per dial.
#[derive(Debug, Default)]
pub struct MockDialer {
    script: VecDeque<Result<Vec<u8>, Error>>,
    pub dialed: Vec<Dialed>,
    pub wire: Wire,
    read_step: usize,
}

impl MockDialer {
    pub fn new() -> Self {
        Self {
            read_step: usize::MAX,
            ..Self::default()
        }
    }

    /// Next dial succeeds and the server answers with `response`.
    pub fn answer(mut self, response: &[u8]) -> Self {
        self.script.push_back(Ok(response.to_vec()));
        self
    }

    /// Next dial fails with `error`.
    pub fn refuse(mut self, error: Error) -> Self {
        self.script.push_back(Err(error));
        self
    }

    /// Reads return at most `step` bytes.
    pub fn trickle(mut self, step: usize) -> Self {
        self.read_step = step;
        self
    }

    /// Everything written on the `n`th connection, as text.
    pub fn sent(&self, n: usize) -> String {
        String::from_utf8(self.wire.lock().unwrap()[n].clone()).unwrap()
    }
}

impl Dialer for MockDialer {
    type Connection = MockConnection;

    fn dial(&mut self, dial: &Dial<'_>) -> Result<Self::Connection, Error> {
        self.dialed.push(Dialed {
            host: dial.host.to_string(),
            port: dial.port,
            secure: dial.secure,
            verify_tls: dial.verify_tls,
            timeout: dial.timeout,
        });
        let response = self
            .script
            .pop_front()
            .unwrap_or(Err(Error::ConnectionRefused))?;

        let mut wire = self.wire.lock().unwrap();
        wire.push(Vec::new());
        Ok(MockConnection {
            response,
            read_pos: 0,
            read_step: self.read_step,
            wire: self.wire.clone(),
            slot: wire.len() - 1,
        })
    }
}
