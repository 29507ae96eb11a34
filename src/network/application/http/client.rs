use core::fmt::Write;

use crate::network::Stream;
use crate::network::error::Error;
use heapless::{String, Vec};

pub const MAX_HEADERS: usize = 16;
pub const MAX_HEADER_NAME_LEN: usize = 64;
pub const MAX_HEADER_VALUE_LEN: usize = 256;
/// Request line plus headers. The body is streamed separately.
pub const MAX_REQUEST_HEAD_LEN: usize = 2048;
/// Status line plus headers of a response.
pub const MAX_RESPONSE_HEAD_LEN: usize = 2048;
/// Response bodies beyond this are read and discarded.
pub const MAX_BODY_LEN: usize = 2048;

const USER_AGENT: &str = "libiot-postqueue/0.1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String<MAX_HEADER_NAME_LEN>,
    pub value: String<MAX_HEADER_VALUE_LEN>,
}

impl Header {
    /// Builds a header, or `None` if either part exceeds its buffer.
    pub fn new(name: &str, value: &str) -> Option<Self> {
        Some(Self {
            name: String::try_from(name).ok()?,
            value: String::try_from(value).ok()?,
        })
    }
}

pub type Headers = Vec<Header, MAX_HEADERS>;

#[derive(Debug)]
pub struct Request<'a> {
    pub method: Method,
    /// Value of the `Host` header, including a non-default port.
    pub host: &'a str,
    pub path: &'a str,
    pub headers: &'a [Header],
    pub body: Option<&'a [u8]>,
}

#[derive(Debug)]
pub struct Response {
    pub status_code: u16,
    pub headers: Headers,
    pub body: Vec<u8, MAX_BODY_LEN>,
    /// Set when the body did not fit in `body` and the rest was discarded.
    pub truncated: bool,
}

impl Response {
    /// Case-insensitive lookup of a response header.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }
}

/// A one-shot HTTP/1.1 client. Every request is sent with `Connection: close`.
pub struct Client<C: Stream> {
    connection: C,
}

impl<C: Stream> Client<C> {
    pub fn new(connection: C) -> Self {
        Self { connection }
    }

    /// Gives the connection back, e.g. to close it.
    pub fn into_inner(self) -> C {
        self.connection
    }

    pub fn request(&mut self, request: &Request) -> Result<Response, Error> {
        // --- Send Request ---
        let head = build_head(request)?;
        write_all(&mut self.connection, &head)?;
        if let Some(body) = request.body {
            write_all(&mut self.connection, body)?;
        }
        self.connection.flush()?;

        // --- Receive Head ---
        let mut head_buf = [0u8; MAX_RESPONSE_HEAD_LEN];
        let mut total_read = 0;
        let head_end = loop {
            if let Some(pos) = find_slice(&head_buf[..total_read], b"\r\n\r\n") {
                break pos;
            }
            if total_read == head_buf.len() {
                return Err(Error::BufferOverflow);
            }
            match self.connection.read(&mut head_buf[total_read..])? {
                0 => return Err(Error::ConnectionClosed),
                n => total_read += n,
            }
        };

        // --- Parse Head ---
        let header_str =
            core::str::from_utf8(&head_buf[..head_end]).map_err(|_| Error::ProtocolError)?;
        let mut lines = header_str.split("\r\n");

        let status_line = lines.next().ok_or(Error::ProtocolError)?;
        let mut status_parts = status_line.splitn(3, ' ');
        let version = status_parts.next().ok_or(Error::ProtocolError)?;
        if !version.starts_with("HTTP/") {
            return Err(Error::ProtocolError);
        }
        let status_code = status_parts
            .next()
            .ok_or(Error::ProtocolError)?
            .parse::<u16>()
            .map_err(|_| Error::ProtocolError)?;

        let mut headers = Headers::new();
        let mut framing = Framing::UntilClose;
        for line in lines {
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            let (name, value) = (name.trim(), value.trim());

            if name.eq_ignore_ascii_case("Content-Length") {
                let len = value.parse::<usize>().map_err(|_| Error::ProtocolError)?;
                framing = Framing::Length(len);
            } else if name.eq_ignore_ascii_case("Transfer-Encoding")
                && value.eq_ignore_ascii_case("chunked")
            {
                framing = Framing::Chunked;
            }

            // Oversized or surplus response headers are not needed by callers.
            if let Some(header) = Header::new(name, value) {
                let _ = headers.push(header);
            }
        }

        if status_code < 200 || status_code == 204 || status_code == 304 {
            framing = Framing::Length(0);
        }

        // --- Receive Body ---
        let mut source = Source {
            connection: &mut self.connection,
            pending: &head_buf[head_end + 4..total_read],
        };
        let mut sink = Sink::default();
        match framing {
            Framing::Length(len) => source.copy(len, &mut sink)?,
            Framing::Chunked => read_chunked(&mut source, &mut sink)?,
            Framing::UntilClose => source.copy_to_end(&mut sink)?,
        }

        Ok(Response {
            status_code,
            headers,
            body: sink.body,
            truncated: sink.truncated,
        })
    }
}

impl<C: Stream + core::fmt::Debug> core::fmt::Debug for Client<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Client")
            .field("connection", &self.connection)
            .finish()
    }
}

#[derive(Debug, Clone, Copy)]
enum Framing {
    Length(usize),
    Chunked,
    UntilClose,
}

fn build_head(request: &Request) -> Result<Vec<u8, MAX_REQUEST_HEAD_LEN>, Error> {
    let mut buf: Vec<u8, MAX_REQUEST_HEAD_LEN> = Vec::new();
    let mut put = |bytes: &[u8]| buf_push(&mut buf, bytes);

    put(request.method.as_str().as_bytes())?;
    put(b" ")?;
    let path: &[u8] = if request.path.is_empty() { b"/" } else { request.path.as_bytes() };
    put(path)?;
    put(b" HTTP/1.1\r\n")?;

    let has = |name: &str| request.headers.iter().any(|h| h.name.eq_ignore_ascii_case(name));
    if !has("Host") {
        put(b"Host: ")?;
        put(request.host.as_bytes())?;
        put(b"\r\n")?;
    }
    if !has("User-Agent") {
        put(b"User-Agent: ")?;
        put(USER_AGENT.as_bytes())?;
        put(b"\r\n")?;
    }
    put(b"Connection: close\r\n")?;

    for header in request.headers {
        put(header.name.as_bytes())?;
        put(b": ")?;
        put(header.value.as_bytes())?;
        put(b"\r\n")?;
    }

    if let Some(body) = request.body {
        let mut len_str: String<20> = String::new();
        write!(len_str, "{}", body.len()).map_err(|_| Error::BufferOverflow)?;
        put(b"Content-Length: ")?;
        put(len_str.as_bytes())?;
        put(b"\r\n")?;
    } else if request.method == Method::Post {
        put(b"Content-Length: 0\r\n")?;
    }
    put(b"\r\n")?;

    Ok(buf)
}

fn buf_push(buf: &mut Vec<u8, MAX_REQUEST_HEAD_LEN>, bytes: &[u8]) -> Result<(), Error> {
    buf.extend_from_slice(bytes).map_err(|_| Error::BufferOverflow)
}

fn write_all<C: Stream>(connection: &mut C, mut bytes: &[u8]) -> Result<(), Error> {
    while !bytes.is_empty() {
        match connection.write(bytes)? {
            0 => return Err(Error::WriteError),
            n => bytes = &bytes[n..],
        }
    }
    Ok(())
}

/// Bytes left over from the head read, then the connection.
struct Source<'a, C: Stream> {
    connection: &'a mut C,
    pending: &'a [u8],
}

impl<C: Stream> Source<'_, C> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        if !self.pending.is_empty() {
            let n = buf.len().min(self.pending.len());
            buf[..n].copy_from_slice(&self.pending[..n]);
            self.pending = &self.pending[n..];
            return Ok(n);
        }
        self.connection.read(buf)
    }

    fn read_byte(&mut self) -> Result<u8, Error> {
        let mut byte = [0u8; 1];
        match self.read(&mut byte)? {
            0 => Err(Error::ConnectionClosed),
            _ => Ok(byte[0]),
        }
    }

    /// Reads one CRLF-terminated line, without the terminator.
    fn read_line<'b>(&mut self, line: &'b mut [u8]) -> Result<&'b [u8], Error> {
        let mut len = 0;
        loop {
            match self.read_byte()? {
                b'\n' => break,
                b'\r' => {}
                b => {
                    if len == line.len() {
                        return Err(Error::ProtocolError);
                    }
                    line[len] = b;
                    len += 1;
                }
            }
        }
        let line: &'b [u8] = line;
        Ok(&line[..len])
    }

    fn copy(&mut self, mut remaining: usize, sink: &mut Sink) -> Result<(), Error> {
        let mut chunk = [0u8; 256];
        while remaining > 0 {
            let want = remaining.min(chunk.len());
            match self.read(&mut chunk[..want])? {
                0 => return Err(Error::ConnectionClosed),
                n => {
                    sink.push(&chunk[..n]);
                    remaining -= n;
                }
            }
        }
        Ok(())
    }

    fn copy_to_end(&mut self, sink: &mut Sink) -> Result<(), Error> {
        let mut chunk = [0u8; 256];
        loop {
            match self.read(&mut chunk)? {
                0 => return Ok(()),
                n => sink.push(&chunk[..n]),
            }
        }
    }
}

fn read_chunked<C: Stream>(source: &mut Source<'_, C>, sink: &mut Sink) -> Result<(), Error> {
    let mut line = [0u8; 64];
    loop {
        let size_line = source.read_line(&mut line)?;
        let size_line = core::str::from_utf8(size_line).map_err(|_| Error::ProtocolError)?;
        let size_hex = size_line.split(';').next().unwrap_or("").trim();
        let size = usize::from_str_radix(size_hex, 16).map_err(|_| Error::ProtocolError)?;

        if size == 0 {
            // Trailer section ends with an empty line.
            while !source.read_line(&mut line)?.is_empty() {}
            return Ok(());
        }

        source.copy(size, sink)?;
        if !source.read_line(&mut line)?.is_empty() {
            return Err(Error::ProtocolError);
        }
    }
}

#[derive(Default)]
struct Sink {
    body: Vec<u8, MAX_BODY_LEN>,
    truncated: bool,
}

impl Sink {
    fn push(&mut self, bytes: &[u8]) {
        let room = self.body.capacity() - self.body.len();
        let take = room.min(bytes.len());
        // Cannot fail: `take` fits the remaining capacity.
        let _ = self.body.extend_from_slice(&bytes[..take]);
        if take < bytes.len() {
            self.truncated = true;
        }
    }
}

/// Finds the first occurrence of a slice in another slice and returns its starting position.
fn find_slice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
