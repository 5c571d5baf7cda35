//! The header data model: names, fields, cookies, first lines, framing.

pub mod cookie;
pub mod error;
pub mod first_line;
pub mod framing;
pub mod headers;
pub mod name;

pub use cookie::Cookie;
pub use error::{ParseError, SerializeError};
pub use first_line::default_reason;
pub use framing::{BodyFraming, CONTENT_LENGTH_CHUNKED, CONTENT_LENGTH_UNKNOWN};
pub use headers::{FieldIter, HeaderOptions, HeaderSet, MessageKind};
