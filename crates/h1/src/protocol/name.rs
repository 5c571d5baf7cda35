//! Header-name canonicalization and special-header classification.
//!
//! Names are normalized to the usual Title-Case-With-Hyphens display form
//! (`content-TYPE` becomes `Content-Type`). A fixed table of well-known
//! names is interned to `&'static str` so the common case never allocates,
//! and a closed [`HeaderKind`] enumeration classifies the headers that have
//! dedicated fast-path storage in the header set.

use std::fmt;

/// The special headers with dedicated storage slots, plus `Other` for
/// everything that lives in the generic field list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderKind {
    Host,
    ContentType,
    ContentEncoding,
    ContentLength,
    TransferEncoding,
    Connection,
    Server,
    UserAgent,
    Cookie,
    SetCookie,
    Trailer,
    Other,
}

impl HeaderKind {
    /// Classifies a raw header name, case-insensitively.
    ///
    /// A space is treated as equivalent to a hyphen: some real clients send
    /// `User Agent`, and routing it anywhere but the user-agent slot would
    /// break them.
    pub fn resolve(name: &[u8]) -> HeaderKind {
        match name.len() {
            4 => {
                if name_eq(name, b"Host") {
                    return HeaderKind::Host;
                }
            }
            6 => {
                if name_eq(name, b"Cookie") {
                    return HeaderKind::Cookie;
                }
                if name_eq(name, b"Server") {
                    return HeaderKind::Server;
                }
            }
            7 => {
                if name_eq(name, b"Trailer") {
                    return HeaderKind::Trailer;
                }
            }
            10 => {
                if name_eq(name, b"Connection") {
                    return HeaderKind::Connection;
                }
                if name_eq(name, b"Set-Cookie") {
                    return HeaderKind::SetCookie;
                }
                if name_eq(name, b"User-Agent") {
                    return HeaderKind::UserAgent;
                }
            }
            12 => {
                if name_eq(name, b"Content-Type") {
                    return HeaderKind::ContentType;
                }
            }
            14 => {
                if name_eq(name, b"Content-Length") {
                    return HeaderKind::ContentLength;
                }
            }
            16 => {
                if name_eq(name, b"Content-Encoding") {
                    return HeaderKind::ContentEncoding;
                }
            }
            17 => {
                if name_eq(name, b"Transfer-Encoding") {
                    return HeaderKind::TransferEncoding;
                }
            }
            _ => {}
        }
        HeaderKind::Other
    }
}

/// A stored header name: either an interned well-known canonical form or an
/// owned byte string (canonicalized, or verbatim when normalization is
/// disabled).
#[derive(Clone, PartialEq, Eq)]
pub enum FieldName {
    Static(&'static str),
    Custom(Vec<u8>),
}

impl FieldName {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            FieldName::Static(s) => s.as_bytes(),
            FieldName::Custom(v) => v,
        }
    }
}

impl fmt::Debug for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.as_bytes()))
    }
}

/// Well-known canonical names, used to short-circuit canonicalization to a
/// pre-built static without touching the allocator.
const WELL_KNOWN: &[&str] = &[
    "Host",
    "Content-Type",
    "Content-Length",
    "Content-Encoding",
    "Transfer-Encoding",
    "Connection",
    "Server",
    "User-Agent",
    "Cookie",
    "Set-Cookie",
    "Trailer",
    "Accept",
    "Accept-Encoding",
    "Accept-Language",
    "Authorization",
    "Cache-Control",
    "Date",
    "ETag",
    "Expires",
    "Last-Modified",
    "Location",
    "Range",
    "Referer",
    "Upgrade",
    "Vary",
];

/// Looks a name up in the well-known table, case-insensitively.
pub(crate) fn intern(name: &[u8]) -> Option<&'static str> {
    WELL_KNOWN.iter().find(|known| name.eq_ignore_ascii_case(known.as_bytes())).copied()
}

/// Normalizes a header name in place: the first letter and every letter
/// following a hyphen are uppercased, the rest lowercased. Idempotent.
pub(crate) fn canonicalize_in_place(name: &mut [u8]) {
    let mut upper = true;
    for byte in name.iter_mut() {
        if *byte == b'-' {
            upper = true;
            continue;
        }
        if upper {
            byte.make_ascii_uppercase();
            upper = false;
        } else {
            byte.make_ascii_lowercase();
        }
    }
}

/// Produces the stored form of a header name.
///
/// With normalization enabled, well-known names intern to a static and
/// everything else is canonicalized into an owned buffer. With it disabled,
/// the name is kept exactly as received.
pub(crate) fn to_field_name(name: &[u8], normalize: bool) -> FieldName {
    if normalize {
        if let Some(known) = intern(name) {
            return FieldName::Static(known);
        }
        let mut owned = name.to_vec();
        canonicalize_in_place(&mut owned);
        FieldName::Custom(owned)
    } else {
        FieldName::Custom(name.to_vec())
    }
}

/// Case-insensitive name comparison that also treats a space as a hyphen.
///
/// The space tolerance is a compatibility exception for clients that send
/// names like `User Agent`.
pub(crate) fn name_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).all(|(x, y)| {
        let x = if *x == b' ' { b'-' } else { x.to_ascii_lowercase() };
        let y = if *y == b' ' { b'-' } else { y.to_ascii_lowercase() };
        x == y
    })
}

/// Field names that must never arrive as trailers.
///
/// Late arrival of any of these after the body could smuggle framing-,
/// routing- or security-relevant data past stages that already ran.
const DENIED_TRAILERS: &[&str] = &[
    "Content-Length",
    "Transfer-Encoding",
    "Host",
    "Connection",
    "Content-Type",
    "Cookie",
    "Set-Cookie",
    "Location",
    "Authorization",
    "X-Real-IP",
];

/// Returns true when `name` is denylisted as a trailer field.
pub(crate) fn is_denied_trailer(name: &[u8]) -> bool {
    if DENIED_TRAILERS.iter().any(|denied| name.eq_ignore_ascii_case(denied.as_bytes())) {
        return true;
    }
    // The whole X-Forwarded-* family carries routing decisions.
    const FORWARDED_PREFIX: &[u8] = b"x-forwarded-";
    name.len() >= FORWARDED_PREFIX.len()
        && name[..FORWARDED_PREFIX.len()].eq_ignore_ascii_case(FORWARDED_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalize_mixed_case() {
        let mut name = b"content-TYPE".to_vec();
        canonicalize_in_place(&mut name);
        assert_eq!(name, b"Content-Type");

        let mut name = b"x-custom-header".to_vec();
        canonicalize_in_place(&mut name);
        assert_eq!(name, b"X-Custom-Header");
    }

    #[test]
    fn canonicalize_is_idempotent() {
        let mut name = b"X-Request-Id".to_vec();
        canonicalize_in_place(&mut name);
        assert_eq!(name, b"X-Request-Id");
        canonicalize_in_place(&mut name);
        assert_eq!(name, b"X-Request-Id");
    }

    #[test]
    fn interns_well_known_names_in_any_case() {
        assert_eq!(intern(b"content-length"), Some("Content-Length"));
        assert_eq!(intern(b"HOST"), Some("Host"));
        assert_eq!(intern(b"X-Whatever"), None);
    }

    #[test]
    fn to_field_name_preserves_raw_when_disabled() {
        match to_field_name(b"weird CASING", false) {
            FieldName::Custom(v) => assert_eq!(v, b"weird CASING"),
            FieldName::Static(_) => panic!("must not intern with normalization disabled"),
        }
    }

    #[test]
    fn resolves_special_kinds() {
        assert_eq!(HeaderKind::resolve(b"content-length"), HeaderKind::ContentLength);
        assert_eq!(HeaderKind::resolve(b"SET-COOKIE"), HeaderKind::SetCookie);
        assert_eq!(HeaderKind::resolve(b"X-Custom"), HeaderKind::Other);
    }

    #[test]
    fn space_matches_hyphen_in_lookups() {
        assert!(name_eq(b"User Agent", b"User-Agent"));
        assert!(name_eq(b"user agent", b"USER-AGENT"));
        assert!(!name_eq(b"User_Agent", b"User-Agent"));
        assert_eq!(HeaderKind::resolve(b"user agent"), HeaderKind::UserAgent);
    }

    #[test]
    fn trailer_denylist() {
        assert!(is_denied_trailer(b"content-length"));
        assert!(is_denied_trailer(b"Set-Cookie"));
        assert!(is_denied_trailer(b"X-Forwarded-For"));
        assert!(is_denied_trailer(b"x-real-ip"));
        assert!(!is_denied_trailer(b"Foo"));
        assert!(!is_denied_trailer(b"X-Request-Id"));
    }
}
