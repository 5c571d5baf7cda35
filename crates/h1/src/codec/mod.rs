//! Wire codec: header block decoding, trailer decoding and serialization.
//!
//! The codec layer turns received bytes into [`HeaderSet`]s and back:
//!
//! - Request handling:
//!   - [`RequestHeaderDecoder`]: decodes request header blocks
//!   - [`parse_request`]: one-shot parse of a complete block
//!
//! - Response handling:
//!   - [`ResponseHeaderDecoder`]: decodes response header blocks
//!   - [`parse_response`]: one-shot parse of a complete block
//!
//! - [`TrailerDecoder`]: decodes the trailer section of a chunked message
//! - [`HeaderEncoder`] / [`serialize`]: writes a header set to the wire
//!
//! The decoders implement `tokio_util::codec::Decoder` and consume nothing
//! from the buffer until a complete block has arrived, so they compose with
//! `FramedRead` over any byte stream.
//!
//! [`HeaderSet`]: crate::protocol::HeaderSet

mod header_decoder;
mod header_encoder;
mod scanner;
mod trailer;

pub use header_decoder::{
    parse_request, parse_request_with, parse_response, parse_response_with, RequestHeaderDecoder,
    ResponseHeaderDecoder, DEFAULT_MAX_HEADER_BYTES,
};
pub use header_encoder::{serialize, HeaderEncoder};
pub use scanner::{shared_newline_diagnostic, NewlineDiagnostic};
pub use trailer::{TrailerDecoder, DEFAULT_MAX_TRAILER_BYTES};
