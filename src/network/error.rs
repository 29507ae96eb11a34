//! Common error types for network operations

/// A common error type for network operations.
///
/// This enum defines the failures a request can hit before a usable HTTP response
/// arrives. It is designed to be simple and portable for `no_std` environments.
/// Each variant maps to a negative status code via [`Error::code`], so transport
/// failures can travel through the same integer channel as HTTP status codes.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// A connection attempt was refused.
    ConnectionRefused,
    /// An error occurred during a write operation.
    WriteError,
    /// An operation was attempted on a connection that is not open.
    NotOpen,
    /// The connection was closed before the response was complete.
    ConnectionClosed,
    /// An error occurred during a read operation.
    ReadError,
    /// The peer did not speak HTTP, or the response was malformed.
    ProtocolError,
    /// A fixed-size request or response buffer was too small.
    BufferOverflow,
    /// A timeout occurred.
    Timeout,
    /// An invalid address or URL was provided.
    InvalidAddress,
    /// A secure connection was requested from a dialer without TLS support.
    TlsUnavailable,
}

impl Error {
    /// The negative status code reported for this error.
    ///
    /// Read and connection-lost failures share `-5`.
    pub fn code(&self) -> i32 {
        match self {
            Error::ConnectionRefused => -1,
            Error::WriteError => -3,
            Error::NotOpen => -4,
            Error::ConnectionClosed => -5,
            Error::ReadError => -5,
            Error::ProtocolError => -7,
            Error::BufferOverflow => -8,
            Error::Timeout => -11,
            Error::InvalidAddress => -12,
            Error::TlsUnavailable => -13,
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let text = match self {
            Error::ConnectionRefused => "connection refused",
            Error::WriteError => "send failed",
            Error::NotOpen => "not connected",
            Error::ConnectionClosed => "connection lost",
            Error::ReadError => "read failed",
            Error::ProtocolError => "malformed http response",
            Error::BufferOverflow => "buffer too small",
            Error::Timeout => "read timeout",
            Error::InvalidAddress => "invalid address",
            Error::TlsUnavailable => "tls not available",
        };
        write!(f, "{} ({})", text, self.code())
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::ConnectionRefused => defmt::write!(f, "ConnectionRefused"),
            Error::WriteError => defmt::write!(f, "WriteError"),
            Error::NotOpen => defmt::write!(f, "NotOpen"),
            Error::ConnectionClosed => defmt::write!(f, "ConnectionClosed"),
            Error::ReadError => defmt::write!(f, "ReadError"),
            Error::ProtocolError => defmt::write!(f, "ProtocolError"),
            Error::BufferOverflow => defmt::write!(f, "BufferOverflow"),
            Error::Timeout => defmt::write!(f, "Timeout"),
            Error::InvalidAddress => defmt::write!(f, "InvalidAddress"),
            Error::TlsUnavailable => defmt::write!(f, "TlsUnavailable"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_negative() {
        let all = [
            Error::ConnectionRefused,
            Error::WriteError,
            Error::NotOpen,
            Error::ConnectionClosed,
            Error::ReadError,
            Error::ProtocolError,
            Error::BufferOverflow,
            Error::Timeout,
            Error::InvalidAddress,
            Error::TlsUnavailable,
        ];
        for e in all {
            assert!(e.code() < 0, "{:?}", e);
        }
    }

    #[test]
    fn refused_is_minus_one() {
        assert_eq!(Error::ConnectionRefused.code(), -1);
    }
}
