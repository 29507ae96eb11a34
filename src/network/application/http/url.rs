//! Minimal `http`/`https` URL handling for request targets and redirects.

use crate::network::error::Error;

/// A request target split into the pieces the client needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target<'a> {
    /// Set for `https://` URLs.
    pub secure: bool,
    pub host: &'a str,
    pub port: u16,
    /// `host` or `host:port`, as sent in the `Host` header.
    pub authority: &'a str,
    /// Path and query, always starting with `/`.
    pub path: &'a str,
}

impl<'a> Target<'a> {
    /// Parses an absolute URL.
    ///
    /// A URL without a scheme is treated as `http://`. User info and fragments are
    /// not supported. IPv6 literals must be bracketed.
    pub fn parse(url: &'a str) -> Result<Self, Error> {
        let url = url.trim();
        let (secure, rest) = if let Some(rest) = strip_prefix_ignore_case(url, "https://") {
            (true, rest)
        } else if let Some(rest) = strip_prefix_ignore_case(url, "http://") {
            (false, rest)
        } else if url.contains("://") {
            return Err(Error::InvalidAddress);
        } else {
            (false, url)
        };

        let rest = rest.split('#').next().unwrap_or("");
        let split = rest.find(['/', '?']).unwrap_or(rest.len());
        let (authority, path) = rest.split_at(split);
        if authority.is_empty() || authority.contains('@') {
            return Err(Error::InvalidAddress);
        }
        let path = if path.is_empty() { "/" } else { path };

        let default_port = if secure { 443 } else { 80 };
        let (host, port) = split_port(authority, default_port)?;

        Ok(Self {
            secure,
            host,
            port,
            authority,
            path,
        })
    }
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}

fn split_port(authority: &str, default_port: u16) -> Result<(&str, u16), Error> {
    if let Some(rest) = authority.strip_prefix('[') {
        let (host, tail) = rest.split_once(']').ok_or(Error::InvalidAddress)?;
        return match tail.strip_prefix(':') {
            Some(port) => Ok((host, parse_port(port)?)),
            None if tail.is_empty() => Ok((host, default_port)),
            None => Err(Error::InvalidAddress),
        };
    }
    match authority.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() => Ok((host, parse_port(port)?)),
        Some(_) => Err(Error::InvalidAddress),
        None => Ok((authority, default_port)),
    }
}

fn parse_port(port: &str) -> Result<u16, Error> {
    match port.parse::<u16>() {
        Ok(0) | Err(_) => Err(Error::InvalidAddress),
        Ok(p) => Ok(p),
    }
}

/// Resolves a `Location` header value against the URL that produced it.
///
/// Absolute URLs are returned as-is; absolute paths keep the scheme and authority
/// of `base`. Relative references are resolved against the directory of the
/// base path.
pub fn resolve<const N: usize>(
    base: &Target<'_>,
    location: &str,
) -> Result<heapless::String<N>, Error> {
    let location = location.trim();
    let mut out = heapless::String::new();
    let mut push = |s: &str| out.push_str(s).map_err(|_| Error::BufferOverflow);

    if location.contains("://") {
        push(location)?;
    } else if let Some(rest) = location.strip_prefix("//") {
        push(if base.secure { "https://" } else { "http://" })?;
        push(rest)?;
    } else {
        push(if base.secure { "https://" } else { "http://" })?;
        push(base.authority)?;
        if location.starts_with('/') {
            push(location)?;
        } else {
            let path = base.path.split('?').next().unwrap_or("/");
            let dir = match path.rfind('/') {
                Some(i) => &path[..=i],
                None => "/",
            };
            push(dir)?;
            push(location)?;
        }
    }
    Ok(out)
}
