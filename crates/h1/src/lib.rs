//! An HTTP/1.x header parsing, normalization and serialization engine
//!
//! This crate turns raw header blocks into structured, queryable header sets
//! and writes them back out, while staying tolerant of the malformed input
//! real clients and servers produce. It is the header layer of an HTTP/1.x
//! stack: body transfer, routing and I/O live elsewhere.
//!
//! # Features
//!
//! - Incremental decoding via `tokio_util::codec::Decoder`: nothing is
//!   consumed until a complete header block has arrived
//! - Canonical Title-Case-After-Hyphen header names, with an opt-out that
//!   preserves received bytes exactly
//! - Fast-path slots for the headers every message touches (Host, Server,
//!   Content-Type, Content-Length, Connection, ...)
//! - Body framing resolved up front: chunked, fixed length or unknown,
//!   with conflicting length signals settled per RFC 9112
//! - Connection lifecycle (keep-alive, close, upgrade) derived from the
//!   protocol version and `Connection` tokens
//! - Cookie parsing for both `Cookie` and `Set-Cookie` directions
//! - Trailer validation with a denylist of frame- and routing-sensitive
//!   names
//! - Lenient line scanning: bare-LF terminators and folded continuation
//!   lines are accepted, lone CRs are rejected
//!
//! # Example
//!
//! ```
//! use bytes::BytesMut;
//! use tokio_util::codec::Decoder;
//! use fleet_h1::codec::{serialize, RequestHeaderDecoder};
//! use fleet_h1::protocol::HeaderSet;
//!
//! // Decode an incoming request header block.
//! let mut buf = BytesMut::from(&b"GET /hello HTTP/1.1\r\nHost: example.com\r\n\r\n"[..]);
//! let request = RequestHeaderDecoder::default().decode(&mut buf).unwrap().unwrap();
//! assert_eq!(request.host(), b"example.com");
//! assert!(!request.connection_close());
//!
//! // Build and serialize a response.
//! let mut response = HeaderSet::new_response();
//! response.set(b"Server", b"fleet");
//! response.set_content_length(12);
//! let wire = serialize(&response).unwrap();
//! assert!(wire.starts_with(b"HTTP/1.1 200 OK\r\n"));
//! ```
//!
//! # Architecture
//!
//! The crate is organized into two modules:
//!
//! - [`protocol`]: the data model — header sets, names, cookies, first
//!   lines, framing and error types
//! - [`codec`]: the wire layer — line scanning, block decoding, trailer
//!   decoding and serialization
//!
//! # Limitations
//!
//! - HTTP/1.x only (HTTP/2 and HTTP/3 framing is binary and out of scope)
//! - Header blocks are limited to 8KB by default

pub mod codec;
pub mod protocol;

mod utils;
