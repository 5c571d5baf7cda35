//! Header block serializer.
//!
//! Encodes a [`HeaderSet`] back onto the wire: the first line, special
//! headers in their fixed precedence order, generic fields in insertion
//! order, cookie lines, and the blank-line terminator. Responses receive an
//! implicit `Date` and `Content-Type` unless suppressed. With the special
//! fast path disabled the set serializes exactly the fields it holds in
//! exactly the order it received them, with no implicit additions, so a
//! parse/serialize pair is byte-faithful modulo line-ending and fold
//! normalization.

use std::io::{self, Write};

use bytes::{BufMut, Bytes, BytesMut};
use tokio_util::codec::Encoder;
use tracing::error;

use crate::protocol::error::SerializeError;
use crate::protocol::first_line::version_token;
use crate::protocol::headers::{HeaderSet, MessageKind};

/// Initial buffer size reserved for one serialized header block.
const INIT_HEADER_SIZE: usize = 4 * 1024;

/// Encoder for header blocks implementing the [`Encoder`] trait.
#[derive(Debug)]
pub struct HeaderEncoder;

impl Encoder<&HeaderSet> for HeaderEncoder {
    type Error = SerializeError;

    fn encode(&mut self, header: &HeaderSet, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(INIT_HEADER_SIZE);

        let Some(proto) = version_token(header.version()) else {
            error!(http_version = ?header.version(), "unsupported http version");
            return Err(SerializeError::UnsupportedVersion { version: header.version() });
        };

        // The URI and reason phrase are raw byte sequences with no
        // guaranteed encoding; they go out exactly as stored.
        match header.kind() {
            MessageKind::Request => {
                write!(FastWrite(dst), "{} ", header.method())?;
                dst.put_slice(header.uri());
                write!(FastWrite(dst), " {proto}\r\n")?;
            }
            MessageKind::Response => {
                write!(FastWrite(dst), "{proto} {} ", header.status())?;
                dst.put_slice(header.reason());
                dst.put_slice(b"\r\n");
            }
        }

        if header.options().disable_special_fast_path {
            // Transparent mode: received fields only, received order, no
            // implicit additions.
            for (name, value) in header.iter() {
                put_field(dst, name, value);
            }
            dst.put_slice(b"\r\n");
            return Ok(());
        }

        if header.kind() == MessageKind::Response {
            if !header.options().no_default_date && header.peek(b"Date").is_none() {
                let mut date = faf_http_date::get_date_buff_no_key();
                faf_http_date::get_date_no_key(&mut date);
                put_field(dst, b"Date", &date);
            }
            if header.stored_content_type().is_empty() && !header.options().no_default_content_type
            {
                put_field(dst, b"Content-Type", header.content_type());
            }
        }

        for (name, value) in header.iter() {
            put_field(dst, name, value);
        }
        dst.put_slice(b"\r\n");
        Ok(())
    }
}

/// Serializes one header block to a frozen buffer.
pub fn serialize(header: &HeaderSet) -> Result<Bytes, SerializeError> {
    let mut dst = BytesMut::new();
    HeaderEncoder.encode(header, &mut dst)?;
    Ok(dst.freeze())
}

fn put_field(dst: &mut BytesMut, name: &[u8], value: &[u8]) {
    dst.put_slice(name);
    dst.put_slice(b": ");
    dst.put_slice(value);
    dst.put_slice(b"\r\n");
}

/// Writer over `BytesMut` that skips the io error plumbing; space has
/// already been reserved.
struct FastWrite<'a>(&'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
