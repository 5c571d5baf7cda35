//! Trailer section decoding for chunked messages.
//!
//! After the terminal zero-length chunk, a chunked message may carry
//! trailer fields followed by a blank line. Trailer names are re-validated
//! on receipt: fields that could alter framing, routing or authorization if
//! injected after the fact are rejected even when the peer advertised them.
//! Accepted fields merge into the message's header set as ordinary fields.

use std::sync::Arc;

use bytes::BytesMut;
use tracing::trace;

use crate::codec::scanner::{scan_fields, shared_newline_diagnostic, LineScanner, NewlineDiagnostic};
use crate::protocol::error::{offending, ParseError};
use crate::protocol::headers::HeaderSet;
use crate::protocol::name::is_denied_trailer;
use crate::utils::ensure;

/// Maximum size in bytes allowed for one trailer section.
pub const DEFAULT_MAX_TRAILER_BYTES: usize = 8 * 1024;

/// Decoder for the trailer section that follows a chunked body.
#[derive(Debug)]
pub struct TrailerDecoder {
    max_trailer_bytes: usize,
    newline: Arc<NewlineDiagnostic>,
}

impl Default for TrailerDecoder {
    fn default() -> Self {
        TrailerDecoder {
            max_trailer_bytes: DEFAULT_MAX_TRAILER_BYTES,
            newline: shared_newline_diagnostic(),
        }
    }
}

impl TrailerDecoder {
    pub fn max_trailer_bytes(mut self, max: usize) -> Self {
        self.max_trailer_bytes = max;
        self
    }

    pub fn newline_diagnostic(mut self, newline: Arc<NewlineDiagnostic>) -> Self {
        self.newline = newline;
        self
    }

    /// Decodes the trailer section into `into`, consuming it from `src`.
    ///
    /// Returns `Ok(None)` (consuming nothing) until the terminating blank
    /// line has arrived. An empty trailer section is just the blank line.
    pub fn decode(
        &mut self,
        src: &mut BytesMut,
        into: &mut HeaderSet,
    ) -> Result<Option<()>, ParseError> {
        let secure = into.options().secure_error_messages;
        let mut scanner = LineScanner::new(&src[..], &self.newline);
        let mut fields: Vec<(Vec<u8>, Vec<u8>)> = Vec::new();

        let complete = scan_fields(&mut scanner, |name, value| {
            if is_denied_trailer(name) {
                return Err(ParseError::forbidden_trailer(offending(secure, name)));
            }
            fields.push((name.to_vec(), value.to_vec()));
            Ok(())
        })?;
        if !complete {
            ensure!(
                src.len() <= self.max_trailer_bytes,
                ParseError::too_large_header(src.len(), self.max_trailer_bytes)
            );
            return Ok(None);
        }

        let consumed = scanner.consumed();
        ensure!(
            consumed <= self.max_trailer_bytes,
            ParseError::too_large_header(consumed, self.max_trailer_bytes)
        );

        for (name, value) in &fields {
            into.ingest_field(name, value)?;
        }
        let _ = src.split_to(consumed);
        trace!(trailer_bytes = consumed, trailer_fields = fields.len(), "decoded trailer section");
        Ok(Some(()))
    }
}
