//! # Application Layer Network Protocols
//!
//! Application layer (OSI Layer 7) protocols used by the POST queue. Each protocol
//! works with the core network traits and keeps a consistent, allocation-free API.
//!
//! ## Available Protocols
//!
//! - **[`http`]**: HTTP/1.1 client, header-block parsing and URL handling
//!
//! ## Design Principles
//!
//! - **Connection Agnostic**: Work with any type implementing [`Connection`](crate::network::Connection)
//! - **No-std Compatible**: Designed for embedded systems without heap allocation
//! - **Resource Conscious**: Use fixed-size buffers and minimal memory

/// HTTP client implementation.
///
/// Provides a small HTTP/1.1 client suitable for embedded systems, supporting
/// GET and POST with custom headers, plus the helpers the transport needs.
pub mod http;
