use std::io;
use thiserror::Error;

/// Errors produced while parsing a header block from wire bytes.
///
/// All parse errors are local to one message: a failed parse never leaves a
/// reused [`HeaderSet`](crate::protocol::HeaderSet) holding stale data,
/// because every parse attempt starts with a full reset.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("malformed first line: {reason}")]
    MalformedFirstLine { reason: String },

    #[error("malformed header line: {reason}")]
    MalformedHeaderLine { reason: String },

    #[error("invalid content-length header: {reason}")]
    InvalidContentLength { reason: String },

    #[error("header size too large, current: {current_size} exceed the limit {max_size}")]
    HeaderTooLarge { current_size: usize, max_size: usize },

    #[error("bad trailer name: {reason}")]
    BadTrailer { reason: String },

    #[error("forbidden trailer received: {reason}")]
    ForbiddenTrailer { reason: String },

    /// Clean end of stream before any byte of the current header block.
    #[error("unexpected end of stream")]
    UnexpectedEof,

    /// The stream ended while a header block was still incomplete.
    #[error("truncated header block")]
    TruncatedInput,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn malformed_first_line<S: ToString>(reason: S) -> Self {
        Self::MalformedFirstLine { reason: reason.to_string() }
    }

    pub fn malformed_header_line<S: ToString>(reason: S) -> Self {
        Self::MalformedHeaderLine { reason: reason.to_string() }
    }

    pub fn invalid_content_length<S: ToString>(reason: S) -> Self {
        Self::InvalidContentLength { reason: reason.to_string() }
    }

    pub fn too_large_header(current_size: usize, max_size: usize) -> Self {
        Self::HeaderTooLarge { current_size, max_size }
    }

    pub fn bad_trailer<S: ToString>(reason: S) -> Self {
        Self::BadTrailer { reason: reason.to_string() }
    }

    pub fn forbidden_trailer<S: ToString>(reason: S) -> Self {
        Self::ForbiddenTrailer { reason: reason.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}

/// Errors produced while rendering a header set back to wire bytes.
#[derive(Error, Debug)]
pub enum SerializeError {
    #[error("unsupported http version: {version:?}")]
    UnsupportedVersion { version: http::Version },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SerializeError {
    pub fn unsupported_version(version: http::Version) -> Self {
        Self::UnsupportedVersion { version }
    }
}

/// Renders the offending input for an error message.
///
/// With `secure` set the raw bytes are withheld, so adversarial input never
/// reaches error text or logs.
pub(crate) fn offending(secure: bool, bytes: &[u8]) -> String {
    if secure { String::from("<input redacted>") } else { String::from_utf8_lossy(bytes).into_owned() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_too_large_message() {
        let err = ParseError::too_large_header(9000, 8192);
        assert_eq!(err.to_string(), "header size too large, current: 9000 exceed the limit 8192");
    }

    #[test]
    fn offending_redacts_when_secure() {
        assert_eq!(offending(false, b"Foo: bar"), "Foo: bar");
        assert_eq!(offending(true, b"Foo: bar"), "<input redacted>");
    }
}
