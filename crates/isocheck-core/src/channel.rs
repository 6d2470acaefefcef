//! Result channel: the byte protocol that carries a test's checks from the isolated child back
//! to the parent.
//!
//! Wire format (one stream per test attempt):
//!
//! ```text
//! stream  := record* END
//! record  := MORE result comment
//! MORE    := 1 byte, != 0          -- another record follows
//! END     := 1 byte, == 0
//! result  := 1 byte                -- 0 = fail, anything else = pass
//! comment := NONE | SOME
//! NONE    := 1 byte, == 0
//! SOME    := 1 byte != 0, usize length (native endian), length + 1 bytes (payload, then 0)
//! ```
//!
//! The length prefix is explicit, so payloads may contain NUL bytes. Both ends run on the same
//! machine (the child is a fork of the parent), so native width and endianness are shared.

use std::io::{self, Read, Write};

use thiserror::Error;

use crate::check::Check;

/// Sentinel announcing another record.
pub const MORE: u8 = b'X';
/// Sentinel closing the stream.
pub const END: u8 = 0;

const COMMENT_NONE: u8 = 0;
const COMMENT_SOME: u8 = b'X';
const TERMINATOR: u8 = 0;
const LENGTH_WIDTH: usize = std::mem::size_of::<usize>();
const READ_CHUNK: usize = 4096;

/// Why a stream could not be decoded in full.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("result stream ended before its end marker")]
    Truncated,
    #[error("reading the result stream failed: {0}")]
    Io(#[source] io::Error),
    #[error("comment of {len} bytes is missing its terminator")]
    MissingTerminator { len: usize },
    #[error("comment of {len} bytes is not valid UTF-8")]
    InvalidUtf8 { len: usize },
    #[error("comment length {len} cannot be framed")]
    LengthOverflow { len: usize },
}

impl From<io::Error> for DecodeError {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Self::Truncated
        } else {
            Self::Io(err)
        }
    }
}

/// Comment slot of a decoded record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedComment {
    Absent,
    Present(String),
    /// The payload was consumed but could not be stored.
    Dropped { len: usize },
}

impl DecodedComment {
    #[must_use]
    pub fn as_deref(&self) -> Option<&str> {
        match self {
            Self::Present(text) => Some(text),
            Self::Absent | Self::Dropped { .. } => None,
        }
    }

    #[must_use]
    pub fn into_option(self) -> Option<String> {
        match self {
            Self::Present(text) => Some(text),
            Self::Absent | Self::Dropped { .. } => None,
        }
    }
}

/// One record read back from the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedCheck {
    pub result: bool,
    pub comment: DecodedComment,
}

/// Write `records` (oldest first) followed by the end marker.
pub fn encode<'a, W, I>(writer: &mut W, records: I) -> io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = (bool, Option<&'a str>)>,
{
    for (result, comment) in records {
        writer.write_all(&[MORE, u8::from(result)])?;
        match comment {
            Some(text) => {
                writer.write_all(&[COMMENT_SOME])?;
                writer.write_all(&text.len().to_ne_bytes())?;
                writer.write_all(text.as_bytes())?;
                writer.write_all(&[TERMINATOR])?;
            }
            None => writer.write_all(&[COMMENT_NONE])?,
        }
    }
    writer.write_all(&[END])
}

/// Write stored checks in recording order.
pub fn encode_checks<W: Write>(writer: &mut W, checks: &[Check]) -> io::Result<()> {
    encode(
        writer,
        checks.iter().map(|check| (check.result(), check.comment())),
    )
}

/// Read records until the end marker.
///
/// Nothing is returned unless the whole stream decodes; the caller never sees a prefix.
pub fn decode<R: Read>(reader: &mut R) -> Result<Vec<DecodedCheck>, DecodeError> {
    let mut decoded = Vec::new();
    while read_byte(reader)? != END {
        let result = read_byte(reader)? != 0;
        let comment = if read_byte(reader)? == COMMENT_NONE {
            DecodedComment::Absent
        } else {
            read_comment(reader)?
        };
        decoded.push(DecodedCheck { result, comment });
    }
    Ok(decoded)
}

/// [`decode`], and on failure keep reading until end of file.
///
/// A writer still producing when the stream turns out malformed then finishes its writes and
/// exits normally instead of dying of `EPIPE`.
pub fn decode_to_eof<R: Read>(reader: &mut R) -> Result<Vec<DecodedCheck>, DecodeError> {
    let decoded = decode(reader);
    if decoded.is_err() {
        let _ = io::copy(reader, &mut io::sink());
    }
    decoded
}

fn read_byte<R: Read>(reader: &mut R) -> Result<u8, DecodeError> {
    let mut byte = [0u8; 1];
    reader.read_exact(&mut byte)?;
    Ok(byte[0])
}

fn read_comment<R: Read>(reader: &mut R) -> Result<DecodedComment, DecodeError> {
    let mut width = [0u8; LENGTH_WIDTH];
    reader.read_exact(&mut width)?;
    let len = usize::from_ne_bytes(width);
    let framed = len
        .checked_add(1)
        .ok_or(DecodeError::LengthOverflow { len })?;

    // Payload is pulled in bounded chunks so a bogus length never turns into one huge
    // allocation; if storage runs out the rest is drained to keep the stream in sync.
    let mut payload: Option<Vec<u8>> = Some(Vec::new());
    let mut chunk = [0u8; READ_CHUNK];
    let mut remaining = framed;
    let mut last = TERMINATOR;
    while remaining > 0 {
        let n = remaining.min(READ_CHUNK);
        reader.read_exact(&mut chunk[..n])?;
        last = chunk[n - 1];
        if let Some(buf) = payload.as_mut() {
            if buf.try_reserve(n).is_ok() {
                buf.extend_from_slice(&chunk[..n]);
            } else {
                payload = None;
            }
        }
        remaining -= n;
    }

    if last != TERMINATOR {
        return Err(DecodeError::MissingTerminator { len });
    }
    let Some(mut bytes) = payload else {
        return Ok(DecodedComment::Dropped { len });
    };
    bytes.truncate(len);
    String::from_utf8(bytes)
        .map(DecodedComment::Present)
        .map_err(|_| DecodeError::InvalidUtf8 { len })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(decoded: &[DecodedCheck]) -> Vec<(bool, Option<&str>)> {
        decoded
            .iter()
            .map(|d| (d.result, d.comment.as_deref()))
            .collect()
    }

    fn encode_pairs(records: &[(bool, Option<&str>)]) -> Vec<u8> {
        let mut out = Vec::new();
        encode(&mut out, records.iter().copied()).unwrap();
        out
    }

    #[test]
    fn empty_stream_is_a_single_end_byte() {
        let bytes = encode_pairs(&[]);
        assert_eq!(bytes, vec![END]);
        assert!(decode(&mut bytes.as_slice()).unwrap().is_empty());
    }

    #[test]
    fn wire_layout_of_one_record() {
        let bytes = encode_pairs(&[(true, Some("ok"))]);
        let mut expected = vec![MORE, 1, COMMENT_SOME];
        expected.extend_from_slice(&2usize.to_ne_bytes());
        expected.extend_from_slice(b"ok\0");
        expected.push(END);
        assert_eq!(bytes, expected);

        let bytes = encode_pairs(&[(false, None)]);
        assert_eq!(bytes, vec![MORE, 0, COMMENT_NONE, END]);
    }

    #[test]
    fn preserves_order_and_comment_shapes() {
        let records = [
            (true, Some("first")),
            (false, None),
            (true, Some("")),
            (false, Some("nul\0inside")),
            (true, Some("ünïcödé")),
        ];
        let bytes = encode_pairs(&records);
        let decoded = decode(&mut bytes.as_slice()).unwrap();
        assert_eq!(pairs(&decoded), records.to_vec());
    }

    #[test]
    fn nonzero_result_byte_means_pass() {
        let bytes = vec![MORE, 7, COMMENT_NONE, END];
        let decoded = decode(&mut bytes.as_slice()).unwrap();
        assert!(decoded[0].result);
    }

    #[test]
    fn every_proper_prefix_is_truncated() {
        let bytes = encode_pairs(&[(true, Some("abc")), (false, None)]);
        for cut in 0..bytes.len() {
            let err = decode(&mut &bytes[..cut]).unwrap_err();
            assert!(
                matches!(err, DecodeError::Truncated),
                "prefix of {cut} bytes: {err:?}"
            );
        }
    }

    #[test]
    fn missing_terminator_is_rejected() {
        let mut bytes = vec![MORE, 1, COMMENT_SOME];
        bytes.extend_from_slice(&2usize.to_ne_bytes());
        bytes.extend_from_slice(b"okX");
        bytes.push(END);
        let err = decode(&mut bytes.as_slice()).unwrap_err();
        assert!(matches!(err, DecodeError::MissingTerminator { len: 2 }));
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let mut bytes = vec![MORE, 1, COMMENT_SOME];
        bytes.extend_from_slice(&1usize.to_ne_bytes());
        bytes.extend_from_slice(&[0xff, 0]);
        bytes.push(END);
        let err = decode(&mut bytes.as_slice()).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidUtf8 { len: 1 }));
    }

    #[test]
    fn huge_length_fails_without_allocating_it() {
        let mut bytes = vec![MORE, 1, COMMENT_SOME];
        bytes.extend_from_slice(&(usize::MAX / 2).to_ne_bytes());
        bytes.extend_from_slice(b"short\0");
        let err = decode(&mut bytes.as_slice()).unwrap_err();
        assert!(matches!(err, DecodeError::Truncated));

        let mut bytes = vec![MORE, 1, COMMENT_SOME];
        bytes.extend_from_slice(&usize::MAX.to_ne_bytes());
        let err = decode(&mut bytes.as_slice()).unwrap_err();
        assert!(matches!(err, DecodeError::LengthOverflow { .. }));
    }

    #[test]
    fn comments_longer_than_one_chunk_roundtrip() {
        let long = "x".repeat(READ_CHUNK * 2 + 17);
        let bytes = encode_pairs(&[(true, Some(&long))]);
        let decoded = decode(&mut bytes.as_slice()).unwrap();
        assert_eq!(decoded[0].comment.as_deref(), Some(long.as_str()));
    }

    #[test]
    fn trailing_bytes_after_end_are_left_unread() {
        let mut bytes = encode_pairs(&[(true, None)]);
        bytes.extend_from_slice(b"garbage");
        let mut cursor = bytes.as_slice();
        assert_eq!(decode(&mut cursor).unwrap().len(), 1);
        assert_eq!(cursor, b"garbage");
    }

    #[test]
    fn malformed_stream_is_read_to_the_end() {
        let mut bytes = vec![MORE, 1, COMMENT_SOME];
        bytes.extend_from_slice(&2usize.to_ne_bytes());
        bytes.extend_from_slice(&[0xff, 0xfe, TERMINATOR]);
        bytes.extend_from_slice(&[MORE; 10_000]);
        let mut cursor = bytes.as_slice();
        let err = decode_to_eof(&mut cursor).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidUtf8 { len: 2 }));
        assert!(cursor.is_empty());
    }

    #[test]
    fn complete_stream_stops_at_its_end_marker() {
        let mut bytes = encode_pairs(&[(false, Some("kept"))]);
        bytes.extend_from_slice(b"after");
        let mut cursor = bytes.as_slice();
        assert_eq!(decode_to_eof(&mut cursor).unwrap().len(), 1);
        assert_eq!(cursor, b"after");
    }

    #[test]
    fn decoded_comment_accessors() {
        assert_eq!(DecodedComment::Absent.as_deref(), None);
        assert_eq!(DecodedComment::Dropped { len: 4 }.into_option(), None);
        assert_eq!(
            DecodedComment::Present("x".into()).into_option(),
            Some("x".to_string())
        );
    }
}
