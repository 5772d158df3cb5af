//! Line-based codec for tokio.
//!
//! Frames CRLF-terminated lines and converts them between bytes and text
//! using the configured charsets. A line ending in a bare `\n`, a line
//! longer than the limit, or bytes left over at end of stream are framing
//! errors: the stream position is unknown afterwards, so the connection
//! has to be dropped.

use std::borrow::Cow;

use bytes::BytesMut;
use encoding::{Encoding, WINDOWS_1252};
use tokio_util::codec::{Decoder, Encoder};
use tracing::debug;

use crate::error::{self, ProtocolError};

/// Largest inbound line accepted, terminator excluded.
pub const MAX_INBOUND_LINE: usize = 8191;

/// Label selecting the protocol decoding mode.
pub const PROTOCOL_ENCODING: &str = "irc";

/// How inbound bytes become text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InboundEncoding {
    /// UTF-8, falling back to Windows-1252 for lines that are not valid
    /// UTF-8. Selected by the label `irc`.
    Protocol,
    /// A fixed charset; undecodable sequences are replaced.
    Charset(&'static Encoding),
}

impl InboundEncoding {
    /// Resolve an encoding label.
    pub fn for_label(label: &str) -> error::Result<Self> {
        if label.eq_ignore_ascii_case(PROTOCOL_ENCODING) {
            Ok(InboundEncoding::Protocol)
        } else {
            charset(label).map(InboundEncoding::Charset)
        }
    }

    fn decode(self, bytes: &[u8]) -> String {
        match self {
            InboundEncoding::Protocol => match std::str::from_utf8(bytes) {
                Ok(text) => text.to_owned(),
                Err(e) => {
                    debug!(valid_up_to = e.valid_up_to(), "inbound line is not UTF-8, decoding as Windows-1252");
                    let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
                    text.into_owned()
                }
            },
            InboundEncoding::Charset(encoding) => {
                let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
                if had_errors {
                    debug!(encoding = encoding.name(), "inbound line had undecodable bytes");
                }
                text.into_owned()
            }
        }
    }
}

/// Look up a charset by its WHATWG label.
pub fn charset(label: &str) -> error::Result<&'static Encoding> {
    Encoding::for_label(label.as_bytes())
        .ok_or_else(|| ProtocolError::UnknownEncoding(label.to_owned()))
}

/// Codec for CRLF-terminated protocol lines.
///
/// Decoded items have the terminator removed; encoded items get it
/// appended.
#[derive(Debug)]
pub struct LineCodec {
    inbound: InboundEncoding,
    outbound: &'static Encoding,
    /// Index of next byte to check for newline
    next_index: usize,
    max_len: usize,
}

impl LineCodec {
    /// Create a codec from inbound and outbound encoding labels.
    pub fn new(inbound: &str, outbound: &str) -> error::Result<Self> {
        Ok(Self {
            inbound: InboundEncoding::for_label(inbound)?,
            outbound: charset(outbound)?,
            next_index: 0,
            max_len: MAX_INBOUND_LINE,
        })
    }

    /// Create a codec with a custom inbound line limit.
    pub fn with_max_len(inbound: &str, outbound: &str, max_len: usize) -> error::Result<Self> {
        let mut codec = Self::new(inbound, outbound)?;
        codec.max_len = max_len;
        Ok(codec)
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self {
            inbound: InboundEncoding::Protocol,
            outbound: encoding::UTF_8,
            next_index: 0,
            max_len: MAX_INBOUND_LINE,
        }
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> error::Result<Option<String>> {
        if let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') {
            let end = self.next_index + offset;
            let line = src.split_to(end + 1);
            self.next_index = 0;

            let Some(body) = line[..end].strip_suffix(b"\r") else {
                return Err(ProtocolError::BareLineFeed);
            };

            if body.len() > self.max_len {
                return Err(ProtocolError::LineTooLong {
                    actual: body.len(),
                    limit: self.max_len,
                });
            }

            Ok(Some(self.inbound.decode(body)))
        } else {
            self.next_index = src.len();

            // One extra byte for a possible pending '\r'.
            if src.len() > self.max_len + 1 {
                return Err(ProtocolError::LineTooLong {
                    actual: src.len(),
                    limit: self.max_len,
                });
            }

            Ok(None)
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> error::Result<Option<String>> {
        match self.decode(src)? {
            Some(line) => Ok(Some(line)),
            None if src.is_empty() => Ok(None),
            None => {
                let pending = src.len();
                src.clear();
                self.next_index = 0;
                Err(ProtocolError::PartialLine(pending))
            }
        }
    }
}

impl Encoder<String> for LineCodec {
    type Error = ProtocolError;

    fn encode(&mut self, line: String, dst: &mut BytesMut) -> error::Result<()> {
        let (bytes, _enc, had_errors) = self.outbound.encode(&line);
        if had_errors {
            debug!(encoding = self.outbound.name(), "outbound line had unmappable characters");
        }
        match bytes {
            Cow::Borrowed(b) => dst.extend_from_slice(b),
            Cow::Owned(v) => dst.extend_from_slice(&v),
        }
        dst.extend_from_slice(b"\r\n");
        Ok(())
    }
}
