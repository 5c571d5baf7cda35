//! Header block decoders for requests and responses.
//!
//! Both decoders implement the [`Decoder`] trait: they consume nothing until
//! a complete header block (first line, fields, blank-line terminator) sits
//! in the buffer, then split it off and return a populated
//! [`HeaderSet`]. `Content-Length` and `Transfer-Encoding` occurrences are
//! collected during the field scan and resolved into the body-framing
//! sentinel in one pass, so conflicting length signals are settled before
//! the caller ever sees the message.

use std::sync::Arc;

use bytes::BytesMut;
use http::Method;
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::codec::scanner::{scan_fields, shared_newline_diagnostic, LineScanner, NewlineDiagnostic, Scan};
use crate::protocol::error::ParseError;
use crate::protocol::first_line::{parse_request_line, parse_status_line};
use crate::protocol::framing::{has_chunked_coding, resolve_framing, FramingContext};
use crate::protocol::headers::{HeaderOptions, HeaderSet, MessageKind};
use crate::protocol::name::HeaderKind;
use crate::utils::ensure;

/// Maximum size in bytes allowed for one header block.
pub const DEFAULT_MAX_HEADER_BYTES: usize = 8 * 1024;

/// Decoder for request header blocks.
#[derive(Debug)]
pub struct RequestHeaderDecoder {
    options: HeaderOptions,
    max_header_bytes: usize,
    newline: Arc<NewlineDiagnostic>,
}

impl Default for RequestHeaderDecoder {
    fn default() -> Self {
        Self::with_options(HeaderOptions::default())
    }
}

impl RequestHeaderDecoder {
    pub fn with_options(options: HeaderOptions) -> Self {
        RequestHeaderDecoder {
            options,
            max_header_bytes: DEFAULT_MAX_HEADER_BYTES,
            newline: shared_newline_diagnostic(),
        }
    }

    pub fn max_header_bytes(mut self, max: usize) -> Self {
        self.max_header_bytes = max;
        self
    }

    pub fn newline_diagnostic(mut self, newline: Arc<NewlineDiagnostic>) -> Self {
        self.newline = newline;
        self
    }

    /// Decodes into a caller-owned header set, resetting it first. Lets a
    /// kept-alive connection reuse one allocation across messages.
    pub fn decode_into(
        &mut self,
        src: &mut BytesMut,
        into: &mut HeaderSet,
    ) -> Result<Option<()>, ParseError> {
        decode_block(
            MessageKind::Request,
            self.options,
            false,
            self.max_header_bytes,
            &self.newline,
            src,
            into,
        )
    }
}

impl Decoder for RequestHeaderDecoder {
    type Item = HeaderSet;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let mut set = HeaderSet::with_options(MessageKind::Request, self.options);
        Ok(self.decode_into(src, &mut set)?.map(|()| set))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(set) => Ok(Some(set)),
            None if src.is_empty() => Ok(None),
            None => Err(ParseError::TruncatedInput),
        }
    }
}

/// Decoder for response header blocks.
#[derive(Debug)]
pub struct ResponseHeaderDecoder {
    options: HeaderOptions,
    max_header_bytes: usize,
    newline: Arc<NewlineDiagnostic>,
    /// The response answers a HEAD request: length headers are recorded but
    /// no body follows.
    head_request: bool,
}

impl Default for ResponseHeaderDecoder {
    fn default() -> Self {
        Self::with_options(HeaderOptions::default())
    }
}

impl ResponseHeaderDecoder {
    pub fn with_options(options: HeaderOptions) -> Self {
        ResponseHeaderDecoder {
            options,
            max_header_bytes: DEFAULT_MAX_HEADER_BYTES,
            newline: shared_newline_diagnostic(),
            head_request: false,
        }
    }

    pub fn for_head_request(mut self) -> Self {
        self.head_request = true;
        self
    }

    pub fn max_header_bytes(mut self, max: usize) -> Self {
        self.max_header_bytes = max;
        self
    }

    pub fn newline_diagnostic(mut self, newline: Arc<NewlineDiagnostic>) -> Self {
        self.newline = newline;
        self
    }

    pub fn decode_into(
        &mut self,
        src: &mut BytesMut,
        into: &mut HeaderSet,
    ) -> Result<Option<()>, ParseError> {
        decode_block(
            MessageKind::Response,
            self.options,
            self.head_request,
            self.max_header_bytes,
            &self.newline,
            src,
            into,
        )
    }
}

impl Decoder for ResponseHeaderDecoder {
    type Item = HeaderSet;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let mut set = HeaderSet::with_options(MessageKind::Response, self.options);
        Ok(self.decode_into(src, &mut set)?.map(|()| set))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(set) => Ok(Some(set)),
            None if src.is_empty() => Ok(None),
            None => Err(ParseError::TruncatedInput),
        }
    }
}

/// One-shot parse of a complete request header block.
pub fn parse_request(buf: &[u8]) -> Result<HeaderSet, ParseError> {
    parse_request_with(buf, HeaderOptions::default())
}

pub fn parse_request_with(buf: &[u8], options: HeaderOptions) -> Result<HeaderSet, ParseError> {
    ensure!(!buf.is_empty(), ParseError::UnexpectedEof);
    let mut src = BytesMut::from(buf);
    RequestHeaderDecoder::with_options(options).decode(&mut src)?.ok_or(ParseError::TruncatedInput)
}

/// One-shot parse of a complete response header block.
pub fn parse_response(buf: &[u8]) -> Result<HeaderSet, ParseError> {
    parse_response_with(buf, HeaderOptions::default())
}

pub fn parse_response_with(buf: &[u8], options: HeaderOptions) -> Result<HeaderSet, ParseError> {
    ensure!(!buf.is_empty(), ParseError::UnexpectedEof);
    let mut src = BytesMut::from(buf);
    ResponseHeaderDecoder::with_options(options).decode(&mut src)?.ok_or(ParseError::TruncatedInput)
}

fn decode_block(
    kind: MessageKind,
    options: HeaderOptions,
    head_request: bool,
    max_header_bytes: usize,
    newline: &NewlineDiagnostic,
    src: &mut BytesMut,
    into: &mut HeaderSet,
) -> Result<Option<()>, ParseError> {
    into.reset();

    let mut scanner = LineScanner::new(&src[..], newline);
    scanner.skip_blank_lines();

    let first_line = match scanner.next_line()? {
        Scan::Line(line) => line,
        // skip_blank_lines leaves the cursor on a non-blank line or the end.
        Scan::Blank | Scan::Partial => {
            ensure!(
                src.len() <= max_header_bytes,
                ParseError::too_large_header(src.len(), max_header_bytes)
            );
            return Ok(None);
        }
    };
    // The raw snapshot covers the field block only, first line excluded.
    let fields_start = scanner.consumed();

    match kind {
        MessageKind::Request => {
            let (method, uri, version) =
                parse_request_line(first_line, options.secure_error_messages)?;
            into.set_method(method);
            into.set_uri(&uri);
            into.set_version(version);
        }
        MessageKind::Response => {
            let (version, status, reason) =
                parse_status_line(first_line, options.secure_error_messages)?;
            into.set_version(version);
            into.set_status(status);
            into.set_reason(&reason);
            into.set_head_response(head_request);
        }
    }

    let mut content_lengths: Vec<Vec<u8>> = Vec::new();
    let mut transfer_encodings: Vec<Vec<u8>> = Vec::new();
    let fast_path = !options.disable_special_fast_path;

    let complete = scan_fields(&mut scanner, |name, value| {
        if fast_path {
            match HeaderKind::resolve(name) {
                HeaderKind::ContentLength => {
                    content_lengths.push(value.to_vec());
                    return Ok(());
                }
                HeaderKind::TransferEncoding => {
                    transfer_encodings.push(value.to_vec());
                    return Ok(());
                }
                _ => {}
            }
        }
        into.ingest_field(name, value)
    })?;
    if !complete {
        ensure!(
            src.len() <= max_header_bytes,
            ParseError::too_large_header(src.len(), max_header_bytes)
        );
        return Ok(None);
    }

    let consumed = scanner.consumed();
    ensure!(
        consumed <= max_header_bytes,
        ParseError::too_large_header(consumed, max_header_bytes)
    );

    // A Transfer-Encoding without the chunked coding carries no framing
    // signal; keep it visible as an ordinary field instead of dropping it.
    if !has_chunked_coding(&transfer_encodings) {
        for value in transfer_encodings.drain(..) {
            into.ingest_field(b"Transfer-Encoding", &value)?;
        }
    }

    let default_method = Method::GET;
    let ctx = FramingContext {
        kind,
        method: if kind == MessageKind::Request { into.method() } else { &default_method },
        status: into.status(),
        head_response: head_request,
        secure: options.secure_error_messages,
    };
    let sentinel = resolve_framing(&ctx, &content_lengths, &transfer_encodings)?;
    into.set_content_length(sentinel);

    let block = src.split_to(consumed);
    if options.disable_special_fast_path {
        into.set_raw_snapshot(block.freeze().slice(fields_start..));
    }
    trace!(header_bytes = consumed, "decoded header block");
    Ok(Some(()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::framing::{BodyFraming, CONTENT_LENGTH_CHUNKED, CONTENT_LENGTH_UNKNOWN};
    use http::Version;
    use indoc::indoc;

    fn crlf(text: &str) -> BytesMut {
        BytesMut::from(text.replace('\n', "\r\n").as_bytes())
    }

    #[test]
    fn from_curl() {
        let mut buf = crlf(indoc! {r"
            GET /index.html HTTP/1.1
            Host: 127.0.0.1:8080
            User-Agent: curl/7.79.1
            Accept: */*

        "});

        let header = RequestHeaderDecoder::default().decode(&mut buf).unwrap().unwrap();

        assert!(buf.is_empty());
        assert_eq!(header.method(), &Method::GET);
        assert_eq!(header.uri(), b"/index.html");
        assert_eq!(header.version(), Version::HTTP_11);
        assert_eq!(header.host(), b"127.0.0.1:8080");
        assert_eq!(header.user_agent(), b"curl/7.79.1");
        assert_eq!(header.peek(b"accept"), Some(&b"*/*"[..]));
        assert_eq!(header.content_length(), CONTENT_LENGTH_UNKNOWN);
        assert!(!header.connection_close());
    }

    #[test]
    fn decode_leaves_trailing_body_bytes() {
        let mut buf = crlf(indoc! {r"
            POST /submit HTTP/1.1
            Host: example.com
            Content-Length: 3

            abc"});

        let header = RequestHeaderDecoder::default().decode(&mut buf).unwrap().unwrap();

        assert_eq!(header.framing(), BodyFraming::Fixed(3));
        assert_eq!(&buf[..], b"abc");
    }

    #[test]
    fn incomplete_block_returns_none_and_consumes_nothing() {
        let mut buf = crlf("GET / HTTP/1.1\nHost: exam");
        let before = buf.len();
        assert!(RequestHeaderDecoder::default().decode(&mut buf).unwrap().is_none());
        assert_eq!(buf.len(), before);
    }

    #[test]
    fn leading_blank_lines_are_skipped() {
        let mut buf = crlf("\n\nGET / HTTP/1.1\nHost: a\n\n");
        let header = RequestHeaderDecoder::default().decode(&mut buf).unwrap().unwrap();
        assert_eq!(header.host(), b"a");
    }

    #[test]
    fn chunked_request() {
        let mut buf = crlf(indoc! {r"
            POST /upload HTTP/1.1
            Host: example.com
            Transfer-Encoding: gzip, chunked

        "});
        let header = RequestHeaderDecoder::default().decode(&mut buf).unwrap().unwrap();
        assert_eq!(header.content_length(), CONTENT_LENGTH_CHUNKED);
        assert!(header.is_chunked());
        assert_eq!(header.peek(b"Transfer-Encoding"), Some(&b"chunked"[..]));
    }

    #[test]
    fn chunked_discards_conflicting_content_length() {
        let mut buf = crlf(indoc! {r"
            POST / HTTP/1.1
            Content-Length: 123
            Transfer-Encoding: chunked

        "});
        let header = RequestHeaderDecoder::default().decode(&mut buf).unwrap().unwrap();
        assert_eq!(header.content_length(), CONTENT_LENGTH_CHUNKED);
        assert!(header.peek(b"Content-Length").is_none());
    }

    #[test]
    fn non_chunked_transfer_encoding_stays_a_field() {
        let mut buf = crlf(indoc! {r"
            HTTP/1.1 200 OK
            Transfer-Encoding: gzip

        "});
        let header = ResponseHeaderDecoder::default().decode(&mut buf).unwrap().unwrap();
        assert_eq!(header.content_length(), CONTENT_LENGTH_UNKNOWN);
        assert_eq!(header.peek(b"Transfer-Encoding"), Some(&b"gzip"[..]));
    }

    #[test]
    fn duplicate_differing_content_length_rejected_on_request() {
        let mut buf = crlf(indoc! {r"
            POST / HTTP/1.1
            Content-Length: 456
            Content-Length: 321

        "});
        assert!(matches!(
            RequestHeaderDecoder::default().decode(&mut buf),
            Err(ParseError::InvalidContentLength { .. })
        ));
    }

    #[test]
    fn duplicate_content_length_last_wins_on_response() {
        let mut buf = crlf(indoc! {r"
            HTTP/1.1 200 OK
            Content-Length: 456
            Content-Length: 321

        "});
        let header = ResponseHeaderDecoder::default().decode(&mut buf).unwrap().unwrap();
        assert_eq!(header.content_length(), 321);
    }

    #[test]
    fn folded_header_value() {
        let mut buf = crlf(indoc! {r"
            GET / HTTP/1.1
            Foo: a;
             b

        "});
        let header = RequestHeaderDecoder::default().decode(&mut buf).unwrap().unwrap();
        assert_eq!(header.peek(b"Foo"), Some(&b"a; b"[..]));
    }

    #[test]
    fn oversized_header_is_rejected() {
        let mut buf = crlf("GET / HTTP/1.1\nHost: example.com\nX-Big: aaaaaaaaaaaaaaaaaaaa\n\n");
        let err = RequestHeaderDecoder::default()
            .max_header_bytes(32)
            .decode(&mut buf)
            .unwrap_err();
        assert!(matches!(err, ParseError::HeaderTooLarge { max_size: 32, .. }));
    }

    #[test]
    fn oversized_partial_header_is_rejected_early() {
        let mut buf = BytesMut::from(&b"GET / HTTP/1.1\r\nX-Fill: aaaaaaaaaaaaaaaaaaaaaaaaaaaaa"[..]);
        let err = RequestHeaderDecoder::default()
            .max_header_bytes(32)
            .decode(&mut buf)
            .unwrap_err();
        assert!(matches!(err, ParseError::HeaderTooLarge { .. }));
    }

    #[test]
    fn response_status_and_reason() {
        let mut buf = crlf(indoc! {r"
            HTTP/1.1 404 Not Found
            Server: fleet
            Content-Length: 0

        "});
        let header = ResponseHeaderDecoder::default().decode(&mut buf).unwrap().unwrap();
        assert_eq!(header.status(), 404);
        assert_eq!(header.reason(), b"Not Found");
        assert_eq!(header.server(), b"fleet");
        assert_eq!(header.framing(), BodyFraming::Fixed(0));
    }

    #[test]
    fn head_response_records_length_but_has_no_body() {
        let mut buf = crlf(indoc! {r"
            HTTP/1.1 200 OK
            Content-Length: 512

        "});
        let header = ResponseHeaderDecoder::default()
            .for_head_request()
            .decode(&mut buf)
            .unwrap()
            .unwrap();
        assert_eq!(header.content_length(), CONTENT_LENGTH_UNKNOWN);
        assert!(!header.connection_close());
    }

    #[test]
    fn response_without_length_forces_close() {
        let mut buf = crlf(indoc! {r"
            HTTP/1.1 200 OK
            Server: fleet

        "});
        let header = ResponseHeaderDecoder::default().decode(&mut buf).unwrap().unwrap();
        assert!(header.connection_close());
    }

    #[test]
    fn cookies_are_collected() {
        let mut buf = crlf(indoc! {r"
            GET / HTTP/1.1
            Cookie: a=1; b=2
            Cookie: c=3

        "});
        let header = RequestHeaderDecoder::default().decode(&mut buf).unwrap().unwrap();
        assert_eq!(header.cookies().len(), 3);
        assert_eq!(header.cookie(b"c").unwrap().value(), b"3");
    }

    #[test]
    fn trailer_header_is_validated_at_parse_time() {
        let mut buf = crlf(indoc! {r"
            POST / HTTP/1.1
            Trailer: Content-Length

        "});
        assert!(matches!(
            RequestHeaderDecoder::default().decode(&mut buf),
            Err(ParseError::BadTrailer { .. })
        ));
    }

    #[test]
    fn disabled_fast_path_preserves_raw_field_block_and_order() {
        // The snapshot covers the field block only: no leading blank lines,
        // no request line, terminator included.
        let fields = "zz-last: 1\r\nHost: example.com\r\nAA-first: 2\r\n\r\n";
        let text = format!("\r\nGET / HTTP/1.1\r\n{fields}");
        let mut buf = BytesMut::from(text.as_bytes());
        let options =
            HeaderOptions { disable_special_fast_path: true, ..HeaderOptions::default() };
        let header =
            RequestHeaderDecoder::with_options(options).decode(&mut buf).unwrap().unwrap();

        assert_eq!(header.raw_header(), Some(fields.as_bytes()));
        let names: Vec<_> = header.iter_received().map(|(name, _)| name.to_vec()).collect();
        assert_eq!(names, vec![b"Zz-Last".to_vec(), b"Host".to_vec(), b"Aa-First".to_vec()]);
    }

    #[test]
    fn decode_into_reuses_the_same_set() {
        let mut decoder = RequestHeaderDecoder::default();
        let mut set = HeaderSet::new_request();

        let mut buf = crlf("GET /a HTTP/1.1\nHost: one\n\n");
        decoder.decode_into(&mut buf, &mut set).unwrap().unwrap();
        assert_eq!(set.host(), b"one");

        let mut buf = crlf("GET /b HTTP/1.1\nX-Only: second\n\n");
        decoder.decode_into(&mut buf, &mut set).unwrap().unwrap();
        assert_eq!(set.uri(), b"/b");
        assert!(set.host().is_empty());
        assert_eq!(set.peek(b"X-Only"), Some(&b"second"[..]));
    }

    #[test]
    fn decode_eof_semantics() {
        let mut decoder = RequestHeaderDecoder::default();

        let mut empty = BytesMut::new();
        assert!(decoder.decode_eof(&mut empty).unwrap().is_none());

        let mut truncated = crlf("GET / HTTP/1.1\nHost: a");
        assert!(matches!(decoder.decode_eof(&mut truncated), Err(ParseError::TruncatedInput)));
    }

    #[test]
    fn one_shot_parse_helpers() {
        assert!(matches!(parse_request(b""), Err(ParseError::UnexpectedEof)));
        assert!(matches!(
            parse_request(b"GET / HTTP/1.1\r\n"),
            Err(ParseError::TruncatedInput)
        ));

        let header = parse_response(b"HTTP/1.1 204 No Content\r\n\r\n").unwrap();
        assert_eq!(header.status(), 204);
        assert!(!header.connection_close());
    }
}
