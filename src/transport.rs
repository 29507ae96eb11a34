//! The seam between the queue worker and the network.
//!
//! The worker never talks to sockets itself. It hands each record, together with
//! the policy in force, to a [`Transport`] and only looks at the resulting status
//! code and body. [`HttpTransport`] is the stock implementation on top of the
//! crate's HTTP/1.1 client and any [`Dialer`]; tests and platforms with their own
//! HTTP stack implement [`Transport`] directly.

use core::time::Duration;

use heapless::{String, Vec};

use crate::network::application::http::client::{
    Client, Header, MAX_BODY_LEN, Method, Request, Response,
};
use crate::network::application::http::url::{self, Target};
use crate::network::error::Error;
use crate::network::{Close, Dial, Dialer};

/// Longest URL a redirect may point at.
pub const MAX_URL_LEN: usize = 512;

/// One POST as seen by a transport.
#[derive(Debug, Clone, Copy)]
pub struct PostRequest<'a> {
    /// Absolute URL of the first hop.
    pub target: &'a str,
    /// Sent unchanged on every hop.
    pub body: &'a str,
    /// Includes `Content-Type: application/json`.
    pub headers: &'a [Header],
    /// Use a secure connection.
    pub secure: bool,
    /// Validate the server certificate when `secure` is set.
    pub verify_tls: bool,
    /// Connect, read and write timeout. Zero means none.
    pub timeout: Duration,
    /// `0` disables redirect following.
    pub max_redirects: u8,
}

/// What came back from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// HTTP status of the final hop.
    pub status: u16,
    /// Response body, truncated to [`MAX_BODY_LEN`] bytes.
    pub body: Vec<u8, MAX_BODY_LEN>,
}

impl Reply {
    /// Copies `body`, keeping at most [`MAX_BODY_LEN`] bytes.
    pub fn new(status: u16, body: &[u8]) -> Self {
        let mut buf = Vec::new();
        let take = body.len().min(MAX_BODY_LEN);
        // Cannot fail: `take` fits the capacity.
        let _ = buf.extend_from_slice(&body[..take]);
        Self { status, body: buf }
    }

    /// The body as text, up to the first invalid UTF-8 sequence.
    ///
    /// A body cut short mid-character keeps everything before that character.
    pub fn body_text(&self) -> &str {
        match core::str::from_utf8(&self.body) {
            Ok(text) => text,
            Err(e) => core::str::from_utf8(&self.body[..e.valid_up_to()]).unwrap_or(""),
        }
    }

    /// `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl From<Response> for Reply {
    fn from(response: Response) -> Self {
        Self {
            status: response.status_code,
            body: response.body,
        }
    }
}

/// Executes a single POST.
///
/// Any response from the server, whatever its status, is `Ok`. `Err` is reserved
/// for failures before a response was received.
pub trait Transport {
    /// Sends `request`, following redirects if the implementation supports them.
    fn post(&mut self, request: &PostRequest<'_>) -> Result<Reply, Error>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn post(&mut self, request: &PostRequest<'_>) -> Result<Reply, Error> {
        (**self).post(request)
    }
}

#[cfg(feature = "std")]
impl<T: Transport + ?Sized> Transport for std::boxed::Box<T> {
    fn post(&mut self, request: &PostRequest<'_>) -> Result<Reply, Error> {
        (**self).post(request)
    }
}

/// [`Transport`] over the crate's HTTP/1.1 client.
///
/// Opens one connection per request (and per redirect hop) through the dialer.
/// Redirects (301, 302, 303, 307, 308) are followed with the same method and body
/// until `max_redirects` hops have been taken; the reply after the last allowed
/// hop is returned as-is, even if it is another redirect.
#[derive(Debug, Default)]
pub struct HttpTransport<D: Dialer> {
    dialer: D,
}

impl<D: Dialer> HttpTransport<D> {
    /// Wraps a dialer.
    pub fn new(dialer: D) -> Self {
        Self { dialer }
    }

    /// The wrapped dialer.
    pub fn dialer(&self) -> &D {
        &self.dialer
    }

    fn post_once(&mut self, target: &Target<'_>, request: &PostRequest<'_>) -> Result<Response, Error> {
        let connection = self.dialer.dial(&Dial {
            host: target.host,
            port: target.port,
            secure: request.secure,
            verify_tls: request.verify_tls,
            timeout: request.timeout,
        })?;

        let mut client = Client::new(connection);
        let result = client.request(&Request {
            method: Method::Post,
            host: target.authority,
            path: target.path,
            headers: request.headers,
            body: Some(request.body.as_bytes()),
        });

        // The reply is complete either way; a failed shutdown changes nothing.
        let _ = client.into_inner().close();
        result
    }
}

fn is_redirect(status: u16) -> bool {
    matches!(status, 301 | 302 | 303 | 307 | 308)
}

impl<D: Dialer> Transport for HttpTransport<D> {
    fn post(&mut self, request: &PostRequest<'_>) -> Result<Reply, Error> {
        let mut url: String<MAX_URL_LEN> =
            String::try_from(request.target).map_err(|_| Error::InvalidAddress)?;
        let mut hops = 0u8;

        loop {
            let target = Target::parse(&url)?;
            let response = self.post_once(&target, request)?;

            if !is_redirect(response.status_code) || hops >= request.max_redirects {
                return Ok(response.into());
            }
            let Some(location) = response.header("Location") else {
                return Ok(response.into());
            };

            let next: String<MAX_URL_LEN> = url::resolve(&target, location)?;
            debug!("redirect {} -> {}", response.status_code, next.as_str());
            hops += 1;
            url = next;
        }
    }
}
