//! Wire Replies
//!
//! One reply per command line, in a small prefix-typed format:
//!
//! ```text
//! +OK\r\n                       success without a value
//! $5\r\nhello\r\n               a value, length-framed (binary safe)
//! $-1\r\n                       null (no value for the key)
//! -EMPTY queue is empty\r\n     an error: CODE, space, message
//! ```
//!
//! Error codes carry the logical error kinds of the store contract
//! (`CONDITION`, `NOTFOUND`, `EMPTY`, `BLOCKED`) plus `ERR` for anything the
//! parser rejected.

use bytes::Bytes;
use std::fmt;

const CRLF: &[u8] = b"\r\n";

/// A reply to a single command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Success with no payload.
    Ok,
    /// A value, framed by its byte length.
    Value(Bytes),
    /// No value (a GET miss).
    Null,
    /// An error; the string is `CODE message`.
    Error(String),
}

impl Reply {
    pub fn ok() -> Self {
        Reply::Ok
    }

    pub fn value(data: impl Into<Bytes>) -> Self {
        Reply::Value(data.into())
    }

    pub fn null() -> Self {
        Reply::Null
    }

    /// Builds an error reply from a code and message.
    pub fn error(code: &str, message: impl fmt::Display) -> Self {
        Reply::Error(format!("{code} {message}"))
    }

    /// Serializes the reply to its wire form.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.serialize_into(&mut buf);
        buf
    }

    /// Serializes the reply into an existing buffer.
    pub fn serialize_into(&self, buf: &mut Vec<u8>) {
        match self {
            Reply::Ok => {
                buf.extend_from_slice(b"+OK");
                buf.extend_from_slice(CRLF);
            }
            Reply::Value(data) => {
                buf.push(b'$');
                buf.extend_from_slice(data.len().to_string().as_bytes());
                buf.extend_from_slice(CRLF);
                buf.extend_from_slice(data);
                buf.extend_from_slice(CRLF);
            }
            Reply::Null => {
                buf.extend_from_slice(b"$-1");
                buf.extend_from_slice(CRLF);
            }
            Reply::Error(message) => {
                buf.push(b'-');
                buf.extend_from_slice(message.as_bytes());
                buf.extend_from_slice(CRLF);
            }
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Ok => write!(f, "OK"),
            Reply::Value(data) => match std::str::from_utf8(data) {
                Ok(s) => write!(f, "\"{s}\""),
                Err(_) => write!(f, "(binary data, {} bytes)", data.len()),
            },
            Reply::Null => write!(f, "(nil)"),
            Reply::Error(message) => write!(f, "(error) {message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_serializes() {
        assert_eq!(Reply::ok().serialize(), b"+OK\r\n");
    }

    #[test]
    fn value_serializes_with_length_frame() {
        assert_eq!(
            Reply::value(Bytes::from("hello")).serialize(),
            b"$5\r\nhello\r\n"
        );
        assert_eq!(Reply::value(Bytes::from("")).serialize(), b"$0\r\n\r\n");
    }

    #[test]
    fn null_serializes() {
        assert_eq!(Reply::null().serialize(), b"$-1\r\n");
    }

    #[test]
    fn error_serializes_with_code() {
        assert_eq!(
            Reply::error("EMPTY", "queue is empty").serialize(),
            b"-EMPTY queue is empty\r\n"
        );
    }
}
