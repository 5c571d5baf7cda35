//! Body framing and connection lifecycle resolution.
//!
//! Once a header block is parsed, two decisions are derived from it: how the
//! body's extent is determined (chunked, fixed length, or connection
//! delimited) and whether the connection stays open afterwards. Both are
//! pure functions of the first line, the `Content-Length` and
//! `Transfer-Encoding` occurrences, and the `Connection` token list, per
//! RFC 9112 sections 6 and 9.

use http::{Method, Version};

use crate::protocol::error::{offending, ParseError};
use crate::protocol::headers::MessageKind;
use crate::utils::trim_ows;

/// Sentinel stored in a header set when the body is chunked.
pub const CONTENT_LENGTH_CHUNKED: i64 = -1;
/// Sentinel stored when no explicit body length is known (identity framing).
pub const CONTENT_LENGTH_UNKNOWN: i64 = -2;

/// The resolved method by which a message body's extent is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFraming {
    /// `Transfer-Encoding: chunked` (sentinel `-1`).
    Chunked,
    /// Explicit `Content-Length` (non-negative).
    Fixed(u64),
    /// No length signal (sentinel `-2`): zero-length for requests,
    /// close-delimited for responses that permit a body.
    Unknown,
}

impl BodyFraming {
    /// Maps the stored content-length sentinel to the framing view.
    pub fn from_sentinel(content_length: i64) -> BodyFraming {
        match content_length {
            CONTENT_LENGTH_CHUNKED => BodyFraming::Chunked,
            n if n >= 0 => BodyFraming::Fixed(n as u64),
            _ => BodyFraming::Unknown,
        }
    }
}

/// Message-level inputs to the framing decision.
pub(crate) struct FramingContext<'a> {
    pub kind: MessageKind,
    pub method: &'a Method,
    pub status: u16,
    /// Set when this is the response to a HEAD request, which never
    /// carries a body regardless of its length headers.
    pub head_response: bool,
    pub secure: bool,
}

/// Resolves the content-length sentinel for one parsed header block.
///
/// Precedence per RFC 9112: a `chunked` transfer coding wins outright and
/// any `Content-Length` present alongside it is discarded (and must not be
/// forwarded — conflicting length signals are the classic smuggling
/// vector). Otherwise the last `Content-Length` occurrence wins; duplicate
/// occurrences that disagree are a hard error on requests and last-wins on
/// responses.
pub(crate) fn resolve_framing(
    ctx: &FramingContext<'_>,
    content_lengths: &[Vec<u8>],
    transfer_encodings: &[Vec<u8>],
) -> Result<i64, ParseError> {
    if has_chunked_coding(transfer_encodings) {
        return Ok(CONTENT_LENGTH_CHUNKED);
    }

    if ctx.kind == MessageKind::Response && ctx.head_response {
        return Ok(CONTENT_LENGTH_UNKNOWN);
    }

    if !content_lengths.is_empty() {
        let mut resolved: Option<u64> = None;
        for raw in content_lengths {
            let value = parse_content_length(raw)
                .ok_or_else(|| ParseError::invalid_content_length(offending(ctx.secure, raw)))?;
            if ctx.kind == MessageKind::Request {
                if let Some(previous) = resolved {
                    if previous != value {
                        return Err(ParseError::invalid_content_length(
                            "duplicate content-length headers with differing values",
                        ));
                    }
                }
            }
            resolved = Some(value);
        }
        // resolved is always Some here; the loop ran at least once.
        let value = resolved.unwrap_or(0);
        return Ok(value as i64);
    }

    Ok(CONTENT_LENGTH_UNKNOWN)
}

/// True when any transfer coding token equals `chunked`, case-insensitively,
/// across all `Transfer-Encoding` occurrences.
pub(crate) fn has_chunked_coding(transfer_encodings: &[Vec<u8>]) -> bool {
    transfer_encodings
        .iter()
        .flat_map(|value| value.split(|b| *b == b','))
        .any(|token| trim_ows(token).eq_ignore_ascii_case(b"chunked"))
}

/// Strict non-negative decimal parse; no sign, no stray bytes, no overflow
/// past `i64::MAX` (the value must fit the sentinel representation).
fn parse_content_length(value: &[u8]) -> Option<u64> {
    let digits = trim_ows(value);
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let parsed = digits
        .iter()
        .try_fold(0u64, |acc, b| acc.checked_mul(10)?.checked_add(u64::from(b - b'0')))?;
    (parsed <= i64::MAX as u64).then_some(parsed)
}

/// Explicit tokens seen in `Connection` header values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ConnectionTokens {
    pub close: bool,
    pub keep_alive: bool,
    pub upgrade: bool,
}

impl ConnectionTokens {
    /// Folds one `Connection` value (a comma-separated token list with
    /// optional surrounding whitespace) into the flags.
    pub fn scan(&mut self, value: &[u8]) {
        for token in value.split(|b| *b == b',') {
            let token = trim_ows(token);
            if token.eq_ignore_ascii_case(b"close") {
                self.close = true;
            } else if token.eq_ignore_ascii_case(b"keep-alive") {
                self.keep_alive = true;
            } else if token.eq_ignore_ascii_case(b"upgrade") {
                self.upgrade = true;
            }
        }
    }
}

/// True when the message, by status or method, never carries a body.
pub(crate) fn body_forbidden(kind: MessageKind, status: u16, method: &Method, head_response: bool) -> bool {
    match kind {
        MessageKind::Response => {
            head_response || (100..200).contains(&status) || status == 204 || status == 304
        }
        MessageKind::Request => {
            matches!(*method, Method::GET | Method::HEAD | Method::DELETE | Method::OPTIONS | Method::CONNECT)
        }
    }
}

/// Resolves keep-alive vs close.
///
/// HTTP/1.1 defaults to keep-alive, HTTP/1.0 and earlier to close. An
/// explicit `close` token always closes; an explicit `keep-alive` token
/// rescues old-protocol defaults. A response whose body is delimited only
/// by connection close must close no matter what the tokens say.
pub(crate) fn resolve_close(
    kind: MessageKind,
    version: Version,
    tokens: ConnectionTokens,
    content_length: i64,
    status: u16,
    method: &Method,
    head_response: bool,
) -> bool {
    if tokens.close {
        return true;
    }
    if kind == MessageKind::Response
        && content_length == CONTENT_LENGTH_UNKNOWN
        && !body_forbidden(kind, status, method, head_response)
    {
        return true;
    }
    if version < Version::HTTP_11 {
        return !tokens.keep_alive;
    }
    false
}

/// The upgrade flag is only honored on a connection that stays open.
pub(crate) fn resolve_upgrade(tokens: ConnectionTokens, close: bool) -> bool {
    tokens.upgrade && !close
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_ctx(method: &Method) -> FramingContext<'_> {
        FramingContext { kind: MessageKind::Request, method, status: 0, head_response: false, secure: false }
    }

    fn response_ctx(status: u16) -> FramingContext<'static> {
        FramingContext {
            kind: MessageKind::Response,
            method: &Method::GET,
            status,
            head_response: false,
            secure: false,
        }
    }

    #[test]
    fn chunked_beats_content_length() {
        let ctx = response_ctx(200);
        let cl = vec![b"12345".to_vec()];
        let te = vec![b"gzip, chunked".to_vec()];
        assert_eq!(resolve_framing(&ctx, &cl, &te).unwrap(), CONTENT_LENGTH_CHUNKED);
    }

    #[test]
    fn chunked_token_found_anywhere_in_list() {
        assert!(has_chunked_coding(&[b"chunked".to_vec()]));
        assert!(has_chunked_coding(&[b"gzip , CHUNKED".to_vec()]));
        assert!(has_chunked_coding(&[b"gzip".to_vec(), b"chunked".to_vec()]));
        assert!(!has_chunked_coding(&[b"gzip".to_vec()]));
        assert!(!has_chunked_coding(&[]));
    }

    #[test]
    fn duplicate_content_length_last_wins_on_response() {
        let ctx = response_ctx(200);
        let cl = vec![b"456".to_vec(), b"321".to_vec()];
        assert_eq!(resolve_framing(&ctx, &cl, &[]).unwrap(), 321);
    }

    #[test]
    fn duplicate_differing_content_length_is_fatal_on_request() {
        let method = Method::POST;
        let ctx = request_ctx(&method);
        let cl = vec![b"456".to_vec(), b"321".to_vec()];
        assert!(matches!(resolve_framing(&ctx, &cl, &[]), Err(ParseError::InvalidContentLength { .. })));
    }

    #[test]
    fn duplicate_equal_content_length_is_fine_on_request() {
        let method = Method::POST;
        let ctx = request_ctx(&method);
        let cl = vec![b"42".to_vec(), b"42".to_vec()];
        assert_eq!(resolve_framing(&ctx, &cl, &[]).unwrap(), 42);
    }

    #[test]
    fn non_numeric_content_length_is_fatal() {
        let ctx = response_ctx(200);
        for bad in [&b"12a"[..], b"-1", b"+5", b""] {
            let cl = vec![bad.to_vec()];
            assert!(matches!(resolve_framing(&ctx, &cl, &[]), Err(ParseError::InvalidContentLength { .. })));
        }
    }

    #[test]
    fn no_signal_resolves_unknown() {
        let ctx = response_ctx(200);
        assert_eq!(resolve_framing(&ctx, &[], &[]).unwrap(), CONTENT_LENGTH_UNKNOWN);
        assert_eq!(BodyFraming::from_sentinel(CONTENT_LENGTH_UNKNOWN), BodyFraming::Unknown);
    }

    #[test]
    fn head_response_never_has_a_body() {
        let mut ctx = response_ctx(200);
        ctx.head_response = true;
        let cl = vec![b"512".to_vec()];
        assert_eq!(resolve_framing(&ctx, &cl, &[]).unwrap(), CONTENT_LENGTH_UNKNOWN);
    }

    #[test]
    fn close_token_always_wins() {
        let mut tokens = ConnectionTokens::default();
        tokens.scan(b" Close , foo");
        assert!(tokens.close);
        assert!(resolve_close(MessageKind::Response, Version::HTTP_11, tokens, 10, 200, &Method::GET, false));
    }

    #[test]
    fn http10_defaults_to_close_unless_keep_alive() {
        let tokens = ConnectionTokens::default();
        assert!(resolve_close(MessageKind::Request, Version::HTTP_10, tokens, 0, 0, &Method::GET, false));

        let mut tokens = ConnectionTokens::default();
        tokens.scan(b"Keep-Alive");
        assert!(!resolve_close(MessageKind::Request, Version::HTTP_10, tokens, 0, 0, &Method::GET, false));
    }

    #[test]
    fn unknown_length_response_forces_close() {
        let tokens = ConnectionTokens::default();
        assert!(resolve_close(
            MessageKind::Response,
            Version::HTTP_11,
            tokens,
            CONTENT_LENGTH_UNKNOWN,
            200,
            &Method::GET,
            false
        ));
    }

    #[test]
    fn no_content_status_keeps_alive_on_http11() {
        let tokens = ConnectionTokens::default();
        assert!(!resolve_close(
            MessageKind::Response,
            Version::HTTP_11,
            tokens,
            CONTENT_LENGTH_UNKNOWN,
            204,
            &Method::GET,
            false
        ));
    }

    #[test]
    fn upgrade_is_suppressed_when_closing() {
        let mut tokens = ConnectionTokens::default();
        tokens.scan(b"Upgrade");
        // HTTP/1.0 without keep-alive resolves to close, so no upgrade.
        let close = resolve_close(MessageKind::Request, Version::HTTP_10, tokens, 0, 0, &Method::GET, false);
        assert!(close);
        assert!(!resolve_upgrade(tokens, close));

        let close = resolve_close(MessageKind::Request, Version::HTTP_11, tokens, 0, 0, &Method::GET, false);
        assert!(!close);
        assert!(resolve_upgrade(tokens, close));
    }
}
