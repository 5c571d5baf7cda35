//! The ordered header store with fast-path slots for special headers.
//!
//! A [`HeaderSet`] holds everything parsed from one request or response
//! header block: the first line, an ordered multi-map of generic fields,
//! and denormalized slots for the headers consulted on every message
//! (Host/Server, Content-Type, Content-Length, Connection and friends).
//! Special headers are never duplicated in the generic list while the fast
//! path is active; `set`/`peek` on their names route to the slot.
//!
//! A `HeaderSet` is owned by one connection-handling flow at a time. It is
//! reusable: [`HeaderSet::reset`] clears all state while retaining buffer
//! capacity, so a kept-alive connection does not reallocate per message.

use std::fmt::Write as _;

use bytes::Bytes;
use http::{Method, Version};
use once_cell::sync::Lazy;
use tracing::warn;

use crate::protocol::cookie::Cookie;
use crate::protocol::error::{offending, ParseError};
use crate::protocol::first_line::default_reason;
use crate::protocol::framing::{
    self, BodyFraming, ConnectionTokens, CONTENT_LENGTH_CHUNKED, CONTENT_LENGTH_UNKNOWN,
};
use crate::protocol::name::{
    is_denied_trailer, name_eq, to_field_name, FieldName, HeaderKind,
};
use crate::utils::trim_ows;

/// Whether a header set describes a request or a response. The two differ
/// in first-line shape, cookie direction, duplicate-Content-Length policy
/// and close-on-unknown-framing behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Request,
    Response,
}

/// Per-instance configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderOptions {
    /// Store names exactly as received; lookups become case-insensitive and
    /// space-tolerant instead.
    pub disable_name_normalization: bool,
    /// Treat special headers as ordinary fields, preserving the full
    /// received ordering (transparent-proxy mode). Also keeps a raw
    /// snapshot of the received field block and suppresses serializer
    /// defaults.
    pub disable_special_fast_path: bool,
    /// Exclude raw offending input bytes from error text.
    pub secure_error_messages: bool,
    /// Suppress the implicit response `Content-Type`.
    pub no_default_content_type: bool,
    /// Suppress the implicit response `Date`.
    pub no_default_date: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct Field {
    pub name: FieldName,
    pub value: Vec<u8>,
}

/// The implicit content type applied to responses that never set one.
pub(crate) fn default_content_type() -> &'static [u8] {
    static TEXT_PLAIN_UTF_8: Lazy<mime::Mime> = Lazy::new(|| mime::TEXT_PLAIN_UTF_8);
    TEXT_PLAIN_UTF_8.as_ref().as_bytes()
}

/// One parsed (or application-built) header block.
#[derive(Debug)]
pub struct HeaderSet {
    kind: MessageKind,
    options: HeaderOptions,

    // First line.
    version: Version,
    method: Method,
    uri: Vec<u8>,
    status: u16,
    reason: Vec<u8>,

    // Generic fields in insertion order.
    fields: Vec<Field>,

    // Fast-path slots.
    host: Vec<u8>,
    server: Vec<u8>,
    user_agent: Vec<u8>,
    content_type: Vec<u8>,
    content_encoding: Vec<u8>,
    /// `-1` chunked, `-2` unknown/identity, otherwise the explicit length.
    content_length: i64,
    content_length_bytes: Vec<u8>,
    connection: Vec<u8>,
    connection_tokens: ConnectionTokens,
    cookies: Vec<Cookie>,
    /// Serialized cookie line cache: one merged `Cookie` line for requests,
    /// one `Set-Cookie` line per cookie for responses.
    cookie_lines: Vec<Vec<u8>>,
    trailer: Vec<FieldName>,
    trailer_line: Vec<u8>,

    /// The received header block, kept verbatim when the fast path is off.
    raw: Option<Bytes>,
    /// Response to a HEAD request: no body follows regardless of framing.
    head_response: bool,
}

impl HeaderSet {
    pub fn new_request() -> Self {
        Self::with_options(MessageKind::Request, HeaderOptions::default())
    }

    pub fn new_response() -> Self {
        Self::with_options(MessageKind::Response, HeaderOptions::default())
    }

    pub fn with_options(kind: MessageKind, options: HeaderOptions) -> Self {
        HeaderSet {
            kind,
            options,
            version: Version::HTTP_11,
            method: Method::GET,
            uri: Vec::new(),
            status: 200,
            reason: Vec::new(),
            fields: Vec::new(),
            host: Vec::new(),
            server: Vec::new(),
            user_agent: Vec::new(),
            content_type: Vec::new(),
            content_encoding: Vec::new(),
            content_length: CONTENT_LENGTH_UNKNOWN,
            content_length_bytes: Vec::new(),
            connection: Vec::new(),
            connection_tokens: ConnectionTokens::default(),
            cookies: Vec::new(),
            cookie_lines: Vec::new(),
            trailer: Vec::new(),
            trailer_line: Vec::new(),
            raw: None,
            head_response: false,
        }
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn options(&self) -> HeaderOptions {
        self.options
    }

    /// Clears all fields and fast-path caches while retaining allocated
    /// buffer capacity, so the instance can be reused across messages on a
    /// kept-alive connection without leaking data from a prior message.
    pub fn reset(&mut self) {
        self.version = Version::HTTP_11;
        self.method = Method::GET;
        self.uri.clear();
        self.status = 200;
        self.reason.clear();
        self.fields.clear();
        self.host.clear();
        self.server.clear();
        self.user_agent.clear();
        self.content_type.clear();
        self.content_encoding.clear();
        self.content_length = CONTENT_LENGTH_UNKNOWN;
        self.content_length_bytes.clear();
        self.connection.clear();
        self.connection_tokens = ConnectionTokens::default();
        self.cookies.clear();
        self.cookie_lines.clear();
        self.trailer.clear();
        self.trailer_line.clear();
        self.raw = None;
        self.head_response = false;
    }

    // First-line accessors.

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn set_method(&mut self, method: Method) {
        self.method = method;
    }

    pub fn uri(&self) -> &[u8] {
        if self.uri.is_empty() { b"/" } else { &self.uri }
    }

    pub fn set_uri(&mut self, uri: &[u8]) {
        self.uri.clear();
        self.uri.extend_from_slice(uri);
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    /// The reason phrase, falling back to the standard phrase for the
    /// status code when none was received or it was cleared.
    pub fn reason(&self) -> &[u8] {
        if self.reason.is_empty() { default_reason(self.status).as_bytes() } else { &self.reason }
    }

    pub fn set_reason(&mut self, reason: &[u8]) {
        self.reason.clear();
        self.reason.extend_from_slice(reason);
    }

    // Framing and connection state.

    /// The content-length sentinel: `-1` chunked, `-2` unknown/identity,
    /// otherwise the explicit body length.
    pub fn content_length(&self) -> i64 {
        self.content_length
    }

    pub fn framing(&self) -> BodyFraming {
        BodyFraming::from_sentinel(self.content_length)
    }

    pub fn is_chunked(&self) -> bool {
        self.content_length == CONTENT_LENGTH_CHUNKED
    }

    /// Sets the framing sentinel. Any negative value other than the chunked
    /// sentinel collapses to unknown; the numeric value and the sentinels
    /// are mutually exclusive by construction.
    pub fn set_content_length(&mut self, length: i64) {
        self.content_length_bytes.clear();
        if length >= 0 {
            self.content_length = length;
            let mut rendered = String::new();
            let _ = write!(rendered, "{length}");
            self.content_length_bytes.extend_from_slice(rendered.as_bytes());
        } else if length == CONTENT_LENGTH_CHUNKED {
            self.content_length = CONTENT_LENGTH_CHUNKED;
        } else {
            self.content_length = CONTENT_LENGTH_UNKNOWN;
        }
    }

    pub fn connection_close(&self) -> bool {
        framing::resolve_close(
            self.kind,
            self.version,
            self.connection_tokens,
            self.content_length,
            self.status,
            &self.method,
            self.head_response,
        )
    }

    pub fn connection_upgrade(&self) -> bool {
        framing::resolve_upgrade(self.connection_tokens, self.connection_close())
    }

    pub(crate) fn set_head_response(&mut self, head: bool) {
        self.head_response = head;
    }

    // Slot accessors.

    pub fn host(&self) -> &[u8] {
        &self.host
    }

    pub fn server(&self) -> &[u8] {
        &self.server
    }

    pub fn user_agent(&self) -> &[u8] {
        &self.user_agent
    }

    pub fn content_encoding(&self) -> &[u8] {
        &self.content_encoding
    }

    /// The content type, substituting the implicit default on responses
    /// that never set one (unless suppressed or in transparent mode).
    pub fn content_type(&self) -> &[u8] {
        if !self.content_type.is_empty() {
            return &self.content_type;
        }
        if self.kind == MessageKind::Response
            && !self.options.no_default_content_type
            && !self.options.disable_special_fast_path
        {
            return default_content_type();
        }
        b""
    }

    /// The received field block verbatim, first line excluded, terminator
    /// included. Only retained when the special-header fast path is
    /// disabled.
    pub fn raw_header(&self) -> Option<&[u8]> {
        self.raw.as_deref()
    }

    pub(crate) fn set_raw_snapshot(&mut self, raw: Bytes) {
        self.raw = Some(raw);
    }

    // Cookies.

    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }

    pub fn cookie(&self, key: &[u8]) -> Option<&Cookie> {
        self.cookies.iter().find(|c| c.key() == key)
    }

    /// Adds or replaces a cookie by key.
    pub fn set_cookie(&mut self, cookie: Cookie) {
        match self.cookies.iter_mut().find(|c| c.key() == cookie.key()) {
            Some(existing) => *existing = cookie,
            None => self.cookies.push(cookie),
        }
        self.refresh_cookie_lines();
    }

    pub fn delete_cookie(&mut self, key: &[u8]) {
        self.cookies.retain(|c| c.key() != key);
        self.refresh_cookie_lines();
    }

    // Trailers.

    /// Declares trailer field names from a comma-separated list.
    ///
    /// Tokens are trimmed and validated against the denylist. Empty and
    /// denylisted tokens are skipped; every safe token is committed no
    /// matter where the bad ones sit in the list, and the first offender
    /// is reported once the whole list has been scanned.
    pub fn declare_trailer(&mut self, list: &[u8]) -> Result<(), ParseError> {
        let result = self.declare_trailer_names(list);
        self.refresh_trailer_line();
        result
    }

    fn declare_trailer_names(&mut self, list: &[u8]) -> Result<(), ParseError> {
        let mut rejected: Option<ParseError> = None;
        for token in list.split(|b| *b == b',') {
            let token = trim_ows(token);
            if token.is_empty() {
                if rejected.is_none() {
                    rejected = Some(ParseError::bad_trailer("empty trailer name"));
                }
                continue;
            }
            if is_denied_trailer(token) {
                if rejected.is_none() {
                    rejected = Some(ParseError::bad_trailer(offending(
                        self.options.secure_error_messages,
                        token,
                    )));
                }
                continue;
            }
            let name = to_field_name(token, !self.options.disable_name_normalization);
            if !self.trailer.iter().any(|existing| name_eq(existing.as_bytes(), name.as_bytes())) {
                self.trailer.push(name);
            }
        }
        match rejected {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// The currently advertised trailer field names.
    pub fn trailer_names(&self) -> impl Iterator<Item = &[u8]> {
        self.trailer.iter().map(FieldName::as_bytes)
    }

    // Generic field operations.

    /// Replaces all occurrences of `name` with a single field. Names of
    /// special headers route to their slot instead.
    pub fn set(&mut self, name: &[u8], value: &[u8]) {
        if self.options.disable_special_fast_path {
            self.set_generic(name, value);
            return;
        }
        match HeaderKind::resolve(name) {
            HeaderKind::Host => assign(&mut self.host, value),
            HeaderKind::Server => assign(&mut self.server, value),
            HeaderKind::UserAgent => assign(&mut self.user_agent, value),
            HeaderKind::ContentType => assign(&mut self.content_type, value),
            HeaderKind::ContentEncoding => assign(&mut self.content_encoding, value),
            HeaderKind::ContentLength => match parse_decimal(value) {
                Some(length) => self.set_content_length(length),
                None => warn!(
                    value = %String::from_utf8_lossy(value),
                    "ignoring non-numeric content-length assignment"
                ),
            },
            HeaderKind::TransferEncoding => {
                if framing::has_chunked_coding(&[value.to_vec()]) {
                    self.set_content_length(CONTENT_LENGTH_CHUNKED);
                } else {
                    warn!("only the chunked transfer coding can be assigned");
                }
            }
            HeaderKind::Connection => {
                self.connection.clear();
                self.connection_tokens = ConnectionTokens::default();
                self.append_connection(value);
            }
            HeaderKind::Cookie if self.kind == MessageKind::Request => {
                self.cookies.clear();
                self.ingest_cookie_pairs(value);
            }
            HeaderKind::SetCookie if self.kind == MessageKind::Response => {
                self.cookies.clear();
                self.ingest_set_cookie(value);
            }
            HeaderKind::Trailer => {
                self.trailer.clear();
                if let Err(e) = self.declare_trailer(value) {
                    warn!(error = %e, "rejected trailer declaration");
                }
            }
            _ => self.set_generic(name, value),
        }
    }

    /// Appends a field, preserving multiplicity and order. Single-slot
    /// special headers keep set semantics; cookies and trailers accumulate.
    pub fn add(&mut self, name: &[u8], value: &[u8]) {
        if self.options.disable_special_fast_path {
            self.push_generic(name, value);
            return;
        }
        match HeaderKind::resolve(name) {
            HeaderKind::Cookie if self.kind == MessageKind::Request => self.ingest_cookie_pairs(value),
            HeaderKind::SetCookie if self.kind == MessageKind::Response => self.ingest_set_cookie(value),
            HeaderKind::Trailer => {
                if let Err(e) = self.declare_trailer(value) {
                    warn!(error = %e, "rejected trailer declaration");
                }
            }
            HeaderKind::Connection => self.append_connection(value),
            HeaderKind::Other => self.push_generic(name, value),
            _ => self.set(name, value),
        }
    }

    /// Removes all occurrences of `name`. Deleting a special header resets
    /// its slot to the type-appropriate empty/default value.
    pub fn delete(&mut self, name: &[u8]) {
        if self.options.disable_special_fast_path {
            self.delete_generic(name);
            return;
        }
        match HeaderKind::resolve(name) {
            HeaderKind::Host => self.host.clear(),
            HeaderKind::Server => self.server.clear(),
            HeaderKind::UserAgent => self.user_agent.clear(),
            HeaderKind::ContentType => self.content_type.clear(),
            HeaderKind::ContentEncoding => self.content_encoding.clear(),
            HeaderKind::ContentLength => self.set_content_length(CONTENT_LENGTH_UNKNOWN),
            HeaderKind::TransferEncoding => {
                if self.content_length == CONTENT_LENGTH_CHUNKED {
                    self.set_content_length(CONTENT_LENGTH_UNKNOWN);
                }
                self.delete_generic(name);
            }
            HeaderKind::Connection => {
                self.connection.clear();
                self.connection_tokens = ConnectionTokens::default();
            }
            HeaderKind::Cookie | HeaderKind::SetCookie => {
                self.cookies.clear();
                self.cookie_lines.clear();
            }
            HeaderKind::Trailer => {
                self.trailer.clear();
                self.trailer_line.clear();
            }
            HeaderKind::Other => self.delete_generic(name),
        }
    }

    /// The first value stored under `name`, routed through the fast-path
    /// slot for special headers. Lookups are case-insensitive (and
    /// space-tolerant) regardless of the normalization setting.
    pub fn peek(&self, name: &[u8]) -> Option<&[u8]> {
        if self.options.disable_special_fast_path {
            return self.peek_generic(name);
        }
        match HeaderKind::resolve(name) {
            HeaderKind::Host => non_empty(&self.host),
            HeaderKind::Server => non_empty(&self.server),
            HeaderKind::UserAgent => non_empty(&self.user_agent),
            HeaderKind::ContentType => non_empty(&self.content_type),
            HeaderKind::ContentEncoding => non_empty(&self.content_encoding),
            HeaderKind::ContentLength => {
                (self.content_length >= 0).then_some(self.content_length_bytes.as_slice())
            }
            HeaderKind::TransferEncoding => {
                // Non-chunked codings live in the generic list.
                if self.is_chunked() { Some(&b"chunked"[..]) } else { self.peek_generic(name) }
            }
            HeaderKind::Connection => non_empty(&self.connection),
            HeaderKind::Cookie if self.kind == MessageKind::Request => {
                self.cookie_lines.first().map(Vec::as_slice)
            }
            HeaderKind::SetCookie if self.kind == MessageKind::Response => {
                self.cookie_lines.first().map(Vec::as_slice)
            }
            HeaderKind::Trailer => non_empty(&self.trailer_line),
            _ => self.peek_generic(name),
        }
    }

    /// All values stored under `name`, in insertion order.
    pub fn peek_all(&self, name: &[u8]) -> Vec<&[u8]> {
        if !self.options.disable_special_fast_path {
            let kind = HeaderKind::resolve(name);
            if kind == HeaderKind::SetCookie && self.kind == MessageKind::Response {
                return self.cookie_lines.iter().map(Vec::as_slice).collect();
            }
            if kind != HeaderKind::Other {
                return self.peek(name).into_iter().collect();
            }
        }
        let query = to_field_name(name, !self.options.disable_name_normalization);
        self.fields
            .iter()
            .filter(|field| self.names_match(&field.name, &query))
            .map(|field| field.value.as_slice())
            .collect()
    }

    /// Iterates all fields: special headers first in a fixed precedence
    /// order, then generic fields in insertion order, then cookie lines.
    /// With the fast path disabled everything lives in the generic list,
    /// so the sequence is exactly the received order.
    pub fn iter(&self) -> FieldIter<'_> {
        FieldIter { set: self, stage: IterStage::Special, index: 0 }
    }

    /// Iterates fields in the order they were first set. Exact when the
    /// special fast path is disabled; otherwise special headers surface in
    /// canonical precedence order because interleaving is not retained.
    pub fn iter_received(&self) -> FieldIter<'_> {
        self.iter()
    }

    // Parse-time ingestion. Content-Length and Transfer-Encoding are
    // collected by the decoder for the framing resolver and never reach
    // this path while the fast path is active.

    pub(crate) fn ingest_field(&mut self, name: &[u8], value: &[u8]) -> Result<(), ParseError> {
        if self.options.disable_special_fast_path {
            self.push_generic(name, value);
            return Ok(());
        }
        match HeaderKind::resolve(name) {
            HeaderKind::Host => assign(&mut self.host, value),
            HeaderKind::Server => assign(&mut self.server, value),
            HeaderKind::UserAgent => assign(&mut self.user_agent, value),
            HeaderKind::ContentType => assign(&mut self.content_type, value),
            HeaderKind::ContentEncoding => assign(&mut self.content_encoding, value),
            HeaderKind::Connection => self.append_connection(value),
            HeaderKind::Cookie if self.kind == MessageKind::Request => self.ingest_cookie_pairs(value),
            HeaderKind::SetCookie if self.kind == MessageKind::Response => self.ingest_set_cookie(value),
            HeaderKind::Trailer => self.declare_trailer(value)?,
            _ => self.push_generic(name, value),
        }
        Ok(())
    }

    fn ingest_cookie_pairs(&mut self, value: &[u8]) {
        let cookies = &mut self.cookies;
        Cookie::parse_pairs(value, |key, val| {
            cookies.push(Cookie::new(key, val));
        });
        self.refresh_cookie_lines();
    }

    fn ingest_set_cookie(&mut self, value: &[u8]) {
        if let Some(cookie) = Cookie::parse_set_cookie(value) {
            self.cookies.push(cookie);
        }
        self.refresh_cookie_lines();
    }

    fn append_connection(&mut self, value: &[u8]) {
        if !self.connection.is_empty() {
            self.connection.extend_from_slice(b", ");
        }
        self.connection.extend_from_slice(trim_ows(value));
        self.connection_tokens.scan(value);
    }

    fn refresh_cookie_lines(&mut self) {
        self.cookie_lines.clear();
        if self.cookies.is_empty() {
            return;
        }
        match self.kind {
            MessageKind::Request => {
                // All request cookies merge into one semicolon-joined line.
                let mut line = Vec::new();
                for (i, cookie) in self.cookies.iter().enumerate() {
                    if i > 0 {
                        line.extend_from_slice(b"; ");
                    }
                    line.extend_from_slice(cookie.key());
                    line.push(b'=');
                    line.extend_from_slice(cookie.value());
                }
                self.cookie_lines.push(line);
            }
            MessageKind::Response => {
                for cookie in &self.cookies {
                    let mut line = Vec::new();
                    cookie.write_set_cookie(&mut line);
                    self.cookie_lines.push(line);
                }
            }
        }
    }

    fn refresh_trailer_line(&mut self) {
        self.trailer_line.clear();
        for (i, name) in self.trailer.iter().enumerate() {
            if i > 0 {
                self.trailer_line.extend_from_slice(b", ");
            }
            self.trailer_line.extend_from_slice(name.as_bytes());
        }
    }

    fn set_generic(&mut self, name: &[u8], value: &[u8]) {
        self.delete_generic(name);
        self.push_generic(name, value);
    }

    fn push_generic(&mut self, name: &[u8], value: &[u8]) {
        let name = to_field_name(name, !self.options.disable_name_normalization);
        self.fields.push(Field { name, value: value.to_vec() });
    }

    fn delete_generic(&mut self, name: &[u8]) {
        let query = to_field_name(name, !self.options.disable_name_normalization);
        let relaxed = self.options.disable_name_normalization;
        self.fields.retain(|field| {
            if relaxed {
                !name_eq(field.name.as_bytes(), query.as_bytes())
            } else {
                field.name.as_bytes() != query.as_bytes()
            }
        });
    }

    fn peek_generic(&self, name: &[u8]) -> Option<&[u8]> {
        let query = to_field_name(name, !self.options.disable_name_normalization);
        self.fields
            .iter()
            .find(|field| self.names_match(&field.name, &query))
            .map(|field| field.value.as_slice())
    }

    fn names_match(&self, stored: &FieldName, query: &FieldName) -> bool {
        if self.options.disable_name_normalization {
            name_eq(stored.as_bytes(), query.as_bytes())
        } else {
            stored.as_bytes() == query.as_bytes()
        }
    }

    pub(crate) fn stored_content_type(&self) -> &[u8] {
        &self.content_type
    }
}

fn assign(slot: &mut Vec<u8>, value: &[u8]) {
    slot.clear();
    slot.extend_from_slice(trim_ows(value));
}

fn non_empty(slot: &[u8]) -> Option<&[u8]> {
    (!slot.is_empty()).then_some(slot)
}

fn parse_decimal(value: &[u8]) -> Option<i64> {
    let digits = trim_ows(value);
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    digits.iter().try_fold(0i64, |acc, b| acc.checked_mul(10)?.checked_add(i64::from(b - b'0')))
}

#[derive(Debug, Clone, Copy)]
enum IterStage {
    Special,
    Generic,
    Cookies,
    Connection,
    Done,
}

/// Iterator over `(name, value)` pairs of a [`HeaderSet`].
#[derive(Debug)]
pub struct FieldIter<'a> {
    set: &'a HeaderSet,
    stage: IterStage,
    index: usize,
}

/// Fixed special-header precedence for iteration and serialization. The
/// connection header is not listed: it always trails the whole block.
const REQUEST_SLOTS: &[HeaderKind] = &[
    HeaderKind::Host,
    HeaderKind::UserAgent,
    HeaderKind::ContentType,
    HeaderKind::ContentEncoding,
    HeaderKind::ContentLength,
    HeaderKind::Trailer,
];

const RESPONSE_SLOTS: &[HeaderKind] = &[
    HeaderKind::Server,
    HeaderKind::ContentType,
    HeaderKind::ContentEncoding,
    HeaderKind::ContentLength,
    HeaderKind::Trailer,
];

impl HeaderSet {
    fn slot_order(&self) -> &'static [HeaderKind] {
        match self.kind {
            MessageKind::Request => REQUEST_SLOTS,
            MessageKind::Response => RESPONSE_SLOTS,
        }
    }

    fn slot_pair(&self, kind: HeaderKind) -> Option<(&[u8], &[u8])> {
        match kind {
            HeaderKind::Host => non_empty(&self.host).map(|v| (&b"Host"[..], v)),
            HeaderKind::Server => non_empty(&self.server).map(|v| (&b"Server"[..], v)),
            HeaderKind::UserAgent => non_empty(&self.user_agent).map(|v| (&b"User-Agent"[..], v)),
            HeaderKind::ContentType => non_empty(&self.content_type).map(|v| (&b"Content-Type"[..], v)),
            HeaderKind::ContentEncoding => {
                non_empty(&self.content_encoding).map(|v| (&b"Content-Encoding"[..], v))
            }
            HeaderKind::ContentLength => {
                if self.content_length >= 0 {
                    Some((&b"Content-Length"[..], self.content_length_bytes.as_slice()))
                } else if self.content_length == CONTENT_LENGTH_CHUNKED {
                    Some((&b"Transfer-Encoding"[..], &b"chunked"[..]))
                } else {
                    None
                }
            }
            HeaderKind::Trailer => non_empty(&self.trailer_line).map(|v| (&b"Trailer"[..], v)),
            _ => None,
        }
    }

    fn cookie_header_name(&self) -> &'static [u8] {
        match self.kind {
            MessageKind::Request => b"Cookie",
            MessageKind::Response => b"Set-Cookie",
        }
    }
}

impl<'a> Iterator for FieldIter<'a> {
    type Item = (&'a [u8], &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.stage {
                IterStage::Special => {
                    let order = self.set.slot_order();
                    while self.index < order.len() {
                        let kind = order[self.index];
                        self.index += 1;
                        if let Some(pair) = self.set.slot_pair(kind) {
                            return Some(pair);
                        }
                    }
                    self.stage = IterStage::Generic;
                    self.index = 0;
                }
                IterStage::Generic => {
                    if let Some(field) = self.set.fields.get(self.index) {
                        self.index += 1;
                        return Some((field.name.as_bytes(), field.value.as_slice()));
                    }
                    self.stage = IterStage::Cookies;
                    self.index = 0;
                }
                IterStage::Cookies => {
                    if let Some(line) = self.set.cookie_lines.get(self.index) {
                        self.index += 1;
                        return Some((self.set.cookie_header_name(), line.as_slice()));
                    }
                    self.stage = IterStage::Connection;
                }
                IterStage::Connection => {
                    self.stage = IterStage::Done;
                    if let Some(value) = non_empty(&self.set.connection) {
                        return Some((&b"Connection"[..], value));
                    }
                }
                IterStage::Done => return None,
            }
        }
    }
}
