//! Request-line and status-line parsing.
//!
//! The first line of a message is parsed apart from the header fields: a
//! request line is `METHOD SP REQUEST-URI [SP HTTP/X.Y]`, a status line is
//! `HTTP/X.Y SP STATUS [SP REASON]`. Methods are validated against the
//! token character set, the status must be exactly three ASCII digits, and
//! absent reason phrases fall back to the standard phrase for the code.

use http::{Method, StatusCode, Version};

use crate::protocol::error::{offending, ParseError};
use crate::utils::trim_ows;

/// Parses a request line.
///
/// A missing protocol token is tolerated for pre-1.0 style clients and is
/// treated as HTTP/1.0 — it is never promoted to HTTP/1.1. Runs of spaces
/// between tokens are accepted.
pub(crate) fn parse_request_line(line: &[u8], secure: bool) -> Result<(Method, Vec<u8>, Version), ParseError> {
    let mut tokens = Tokens::new(line);

    let method_token =
        tokens.next().ok_or_else(|| ParseError::malformed_first_line(offending(secure, line)))?;
    let method = Method::from_bytes(method_token)
        .map_err(|_| ParseError::malformed_first_line(offending(secure, line)))?;

    let uri = tokens.next().ok_or_else(|| ParseError::malformed_first_line(offending(secure, line)))?;
    if uri.is_empty() {
        return Err(ParseError::malformed_first_line(offending(secure, line)));
    }

    let version = match tokens.next() {
        Some(proto) => parse_version(proto)
            .ok_or_else(|| ParseError::malformed_first_line(offending(secure, line)))?,
        None => Version::HTTP_10,
    };

    Ok((method, uri.to_vec(), version))
}

/// Parses a status line. The reason phrase is optional; callers substitute
/// the standard phrase when it is empty.
pub(crate) fn parse_status_line(line: &[u8], secure: bool) -> Result<(Version, u16, Vec<u8>), ParseError> {
    let mut tokens = Tokens::new(line);

    let proto = tokens.next().ok_or_else(|| ParseError::malformed_first_line(offending(secure, line)))?;
    let version =
        parse_version(proto).ok_or_else(|| ParseError::malformed_first_line(offending(secure, line)))?;

    let status_token =
        tokens.next().ok_or_else(|| ParseError::malformed_first_line(offending(secure, line)))?;
    if status_token.len() != 3 || !status_token.iter().all(u8::is_ascii_digit) {
        return Err(ParseError::malformed_first_line(offending(secure, line)));
    }
    let status = status_token.iter().fold(0u16, |acc, b| acc * 10 + u16::from(b - b'0'));

    // Everything after the status token is the reason phrase, spaces included.
    let reason = trim_ows(tokens.rest());

    Ok((version, status, reason.to_vec()))
}

/// The standard reason phrase for a status code.
pub fn default_reason(status: u16) -> &'static str {
    StatusCode::from_u16(status).ok().and_then(|code| code.canonical_reason()).unwrap_or("Unknown Status Code")
}

fn parse_version(token: &[u8]) -> Option<Version> {
    match token {
        b"HTTP/1.1" => Some(Version::HTTP_11),
        b"HTTP/1.0" => Some(Version::HTTP_10),
        b"HTTP/0.9" => Some(Version::HTTP_09),
        _ => None,
    }
}

/// Renders a version for the wire. Only 1.x versions are serializable.
pub(crate) fn version_token(version: Version) -> Option<&'static str> {
    match version {
        Version::HTTP_11 => Some("HTTP/1.1"),
        Version::HTTP_10 => Some("HTTP/1.0"),
        Version::HTTP_09 => Some("HTTP/0.9"),
        _ => None,
    }
}

/// Splits a line on runs of spaces.
struct Tokens<'a> {
    line: &'a [u8],
    pos: usize,
}

impl<'a> Tokens<'a> {
    fn new(line: &'a [u8]) -> Self {
        Tokens { line, pos: 0 }
    }

    /// The unconsumed remainder of the line.
    fn rest(&self) -> &'a [u8] {
        &self.line[self.pos.min(self.line.len())..]
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        while self.pos < self.line.len() && self.line[self.pos] == b' ' {
            self.pos += 1;
        }
        if self.pos >= self.line.len() {
            return None;
        }
        let start = self.pos;
        while self.pos < self.line.len() && self.line[self.pos] != b' ' {
            self.pos += 1;
        }
        Some(&self.line[start..self.pos])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_request_line() {
        let (method, uri, version) = parse_request_line(b"GET /index.html HTTP/1.1", false).unwrap();
        assert_eq!(method, Method::GET);
        assert_eq!(uri, b"/index.html");
        assert_eq!(version, Version::HTTP_11);
    }

    #[test]
    fn missing_protocol_is_not_assumed_to_be_1_1() {
        let (method, uri, version) = parse_request_line(b"GET /", false).unwrap();
        assert_eq!(method, Method::GET);
        assert_eq!(uri, b"/");
        assert_eq!(version, Version::HTTP_10);
    }

    #[test]
    fn method_with_invalid_token_chars_is_rejected() {
        assert!(matches!(
            parse_request_line(b"(GET / HTTP/1.1", false),
            Err(ParseError::MalformedFirstLine { .. })
        ));
    }

    #[test]
    fn lonely_method_is_rejected() {
        assert!(matches!(parse_request_line(b"GET", false), Err(ParseError::MalformedFirstLine { .. })));
    }

    #[test]
    fn extra_spaces_between_tokens() {
        let (method, uri, version) = parse_request_line(b"POST  /submit   HTTP/1.0", false).unwrap();
        assert_eq!(method, Method::POST);
        assert_eq!(uri, b"/submit");
        assert_eq!(version, Version::HTTP_10);
    }

    #[test]
    fn status_line_with_reason() {
        let (version, status, reason) = parse_status_line(b"HTTP/1.1 404 Not Found", false).unwrap();
        assert_eq!(version, Version::HTTP_11);
        assert_eq!(status, 404);
        assert_eq!(reason, b"Not Found");
    }

    #[test]
    fn status_line_without_reason() {
        let (_, status, reason) = parse_status_line(b"HTTP/1.1 200", false).unwrap();
        assert_eq!(status, 200);
        assert!(reason.is_empty());
        assert_eq!(default_reason(200), "OK");
    }

    #[test]
    fn multi_word_reason_is_kept_whole() {
        let (_, _, reason) = parse_status_line(b"HTTP/1.0 505 HTTP Version Not Supported", false).unwrap();
        assert_eq!(reason, b"HTTP Version Not Supported");
    }

    #[test]
    fn status_must_be_three_digits() {
        assert!(parse_status_line(b"HTTP/1.1 20 OK", false).is_err());
        assert!(parse_status_line(b"HTTP/1.1 2000 OK", false).is_err());
        assert!(parse_status_line(b"HTTP/1.1 2O0 OK", false).is_err());
    }

    #[test]
    fn unknown_status_reason_fallback() {
        assert_eq!(default_reason(999), "Unknown Status Code");
        assert_eq!(default_reason(99), "Unknown Status Code");
    }

    #[test]
    fn secure_errors_hide_input() {
        let err = parse_request_line(b"(GET /secret-path HTTP/1.1", true).unwrap_err();
        assert!(!err.to_string().contains("secret-path"));
    }
}
