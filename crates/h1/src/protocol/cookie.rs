//! Cookie value type and wire conversion.
//!
//! Cookies are stored apart from the generic header fields: a request
//! carries an ordered list of key/value pairs merged into a single
//! `Cookie:` line, a response carries one `Set-Cookie:` line per cookie.
//! Only the attributes the engine needs are modeled (key, value, domain,
//! path, expiry); everything else on a received `Set-Cookie` line is
//! dropped.

use std::time::SystemTime;

use crate::utils::trim_ows;

/// A single cookie with its optional attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cookie {
    key: Vec<u8>,
    value: Vec<u8>,
    domain: Vec<u8>,
    path: Vec<u8>,
    expires: Option<SystemTime>,
}

impl Cookie {
    pub fn new(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Cookie { key: key.into(), value: value.into(), ..Cookie::default() }
    }

    pub fn key(&self) -> &[u8] {
        &self.key
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    pub fn domain(&self) -> &[u8] {
        &self.domain
    }

    pub fn path(&self) -> &[u8] {
        &self.path
    }

    pub fn expires(&self) -> Option<SystemTime> {
        self.expires
    }

    pub fn set_value(&mut self, value: impl Into<Vec<u8>>) {
        self.value = value.into();
    }

    pub fn set_domain(&mut self, domain: impl Into<Vec<u8>>) {
        self.domain = domain.into();
    }

    pub fn set_path(&mut self, path: impl Into<Vec<u8>>) {
        self.path = path.into();
    }

    pub fn set_expires(&mut self, expires: SystemTime) {
        self.expires = Some(expires);
    }

    /// Parses a `Set-Cookie` line into a cookie.
    ///
    /// The first `key=value` segment names the cookie; recognized attribute
    /// segments fill in domain, path and expiry. Unknown attributes are
    /// skipped, malformed attribute values are treated as absent — real
    /// servers emit enough junk that strictness here only loses cookies.
    ///
    /// Returns `None` when the line has no cookie name at all.
    pub fn parse_set_cookie(line: &[u8]) -> Option<Cookie> {
        let mut segments = split_segments(line);

        let (key, value) = segments.next()?;
        if key.is_empty() {
            return None;
        }
        let mut cookie = Cookie::new(key, value);

        for (attr, attr_value) in segments {
            if attr.eq_ignore_ascii_case(b"domain") {
                cookie.domain = attr_value.to_vec();
            } else if attr.eq_ignore_ascii_case(b"path") {
                cookie.path = attr_value.to_vec();
            } else if attr.eq_ignore_ascii_case(b"expires") {
                if let Ok(s) = std::str::from_utf8(attr_value) {
                    cookie.expires = httpdate::parse_http_date(s).ok();
                }
            }
        }
        Some(cookie)
    }

    /// Parses a request `Cookie` line (`k1=v1; k2=v2`) into pairs.
    pub fn parse_pairs(line: &[u8], mut each: impl FnMut(&[u8], &[u8])) {
        for (key, value) in split_segments(line) {
            if !key.is_empty() {
                each(key, value);
            }
        }
    }

    /// Renders this cookie as a `Set-Cookie` value.
    pub fn write_set_cookie(&self, dst: &mut Vec<u8>) {
        dst.extend_from_slice(&self.key);
        dst.push(b'=');
        dst.extend_from_slice(&self.value);
        if !self.domain.is_empty() {
            dst.extend_from_slice(b"; Domain=");
            dst.extend_from_slice(&self.domain);
        }
        if !self.path.is_empty() {
            dst.extend_from_slice(b"; Path=");
            dst.extend_from_slice(&self.path);
        }
        if let Some(expires) = self.expires {
            dst.extend_from_slice(b"; Expires=");
            dst.extend_from_slice(httpdate::fmt_http_date(expires).as_bytes());
        }
    }
}

/// Splits a cookie line on `;`, yielding trimmed `(key, value)` segments.
/// A segment without `=` yields an empty value (e.g. `HttpOnly`).
fn split_segments(line: &[u8]) -> impl Iterator<Item = (&[u8], &[u8])> {
    line.split(|b| *b == b';').filter_map(|segment| {
        let segment = trim_ows(segment);
        if segment.is_empty() {
            return None;
        }
        match segment.iter().position(|b| *b == b'=') {
            Some(eq) => Some((trim_ows(&segment[..eq]), trim_ows(&segment[eq + 1..]))),
            None => Some((segment, &b""[..])),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn parse_plain_set_cookie() {
        let cookie = Cookie::parse_set_cookie(b"sid=abc123").unwrap();
        assert_eq!(cookie.key(), b"sid");
        assert_eq!(cookie.value(), b"abc123");
        assert!(cookie.domain().is_empty());
        assert!(cookie.expires().is_none());
    }

    #[test]
    fn parse_set_cookie_with_attributes() {
        let cookie = Cookie::parse_set_cookie(
            b"sid=abc; Domain=example.com; Path=/app; Expires=Tue, 10 Nov 2009 23:00:00 GMT; HttpOnly",
        )
        .unwrap();
        assert_eq!(cookie.value(), b"abc");
        assert_eq!(cookie.domain(), b"example.com");
        assert_eq!(cookie.path(), b"/app");
        assert!(cookie.expires().is_some());
    }

    #[test]
    fn bad_expires_is_dropped_not_fatal() {
        let cookie = Cookie::parse_set_cookie(b"sid=abc; Expires=not-a-date").unwrap();
        assert!(cookie.expires().is_none());
    }

    #[test]
    fn parse_request_pairs() {
        let mut pairs = Vec::new();
        Cookie::parse_pairs(b"a=1; b=2 ;c=3", |k, v| pairs.push((k.to_vec(), v.to_vec())));
        assert_eq!(
            pairs,
            vec![
                (b"a".to_vec(), b"1".to_vec()),
                (b"b".to_vec(), b"2".to_vec()),
                (b"c".to_vec(), b"3".to_vec())
            ]
        );
    }

    #[test]
    fn set_cookie_round_trip() {
        let mut cookie = Cookie::new("sid", "abc");
        cookie.set_domain("example.com");
        cookie.set_path("/");
        cookie.set_expires(SystemTime::UNIX_EPOCH + Duration::from_secs(1_257_894_000));

        let mut line = Vec::new();
        cookie.write_set_cookie(&mut line);

        let parsed = Cookie::parse_set_cookie(&line).unwrap();
        assert_eq!(parsed, cookie);
    }
}
