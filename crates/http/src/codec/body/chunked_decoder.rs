//! Decoder implementation for HTTP chunked transfer encoding.
//!
//! This module provides functionality to decode HTTP messages that use chunked transfer encoding
//! as specified in [RFC 7230 Section 4.1](https://tools.ietf.org/html/rfc7230#section-4.1).
//!
//! Chunk extensions and trailer fields are read and discarded.

use crate::protocol::{ParseError, PayloadItem};
use bytes::{Buf, BytesMut};
use std::cmp;
use tokio_util::codec::Decoder;
use tracing::trace;
use ChunkedState::*;

/// A decoder for handling HTTP chunked transfer encoding.
///
/// The decoder is fed one byte at a time through the framing lines and hands out
/// chunk data as soon as any of it is buffered, so a chunk split across reads comes
/// out as several [`PayloadItem::Chunk`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedDecoder {
    state: ChunkedState,
    remaining: u64,
}

impl ChunkedDecoder {
    pub fn new() -> Self {
        Self { state: SizeStart, remaining: 0 }
    }
}

impl Default for ChunkedDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkedState {
    /// First hex digit of the chunk size
    SizeStart,
    /// Remaining hex digits of the chunk size
    Size,
    /// Whitespace after the size
    SizeLws,
    /// Chunk extension, ignored
    Extension,
    /// LF ending the size line
    SizeLf,
    /// Chunk data
    Data,
    /// CR after chunk data
    DataCr,
    /// LF after chunk data
    DataLf,
    /// Trailer field, ignored
    Trailer,
    /// LF ending a trailer field
    TrailerLf,
    /// CR of the final blank line, or the start of a trailer field
    EndCr,
    /// LF of the final blank line
    EndLf,
    /// The zero-size chunk and its blank line have been read
    End,
}

impl Decoder for ChunkedDecoder {
    type Item = PayloadItem;
    type Error = ParseError;

    /// Decodes chunked transfer encoded data from the input buffer.
    ///
    /// # Returns
    /// - `Ok(Some(PayloadItem::Chunk(bytes)))` when chunk data is available
    /// - `Ok(Some(PayloadItem::Eof))` once the last chunk has been read
    /// - `Ok(None)` when more data is needed
    /// - `Err(ParseError)` if the chunked framing is invalid
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            match self.state {
                End => {
                    trace!("finished reading chunked data");
                    return Ok(Some(PayloadItem::Eof));
                }

                Data => {
                    if src.is_empty() {
                        return Ok(None);
                    }

                    let read_size = cmp::min(self.remaining, src.len() as u64) as usize;
                    self.remaining -= read_size as u64;
                    if self.remaining == 0 {
                        self.state = DataCr;
                    }

                    trace!(len = read_size, "read chunked bytes");
                    return Ok(Some(PayloadItem::Chunk(src.split_to(read_size).freeze())));
                }

                _ => {
                    if !src.has_remaining() {
                        return Ok(None);
                    }
                    let b = src.get_u8();
                    self.state = self.next_state(b)?;
                }
            }
        }
    }
}

impl ChunkedDecoder {
    /// Advances the framing state machine by one byte.
    fn next_state(&mut self, b: u8) -> Result<ChunkedState, ParseError> {
        match self.state {
            SizeStart => match b {
                b'0'..=b'9' | b'a'..=b'f' | b'A'..=b'F' => {
                    self.remaining = u64::from(hex_value(b));
                    Ok(Size)
                }
                _ => Err(ParseError::invalid_body("chunk size line without digits")),
            },

            Size => match b {
                b'0'..=b'9' | b'a'..=b'f' | b'A'..=b'F' => {
                    let digit = u64::from(hex_value(b));
                    self.remaining = self
                        .remaining
                        .checked_mul(16)
                        .and_then(|size| size.checked_add(digit))
                        .ok_or_else(|| ParseError::invalid_body("chunk size overflow"))?;
                    Ok(Size)
                }
                b'\t' | b' ' => Ok(SizeLws),
                b';' => Ok(Extension),
                b'\r' => Ok(SizeLf),
                _ => Err(ParseError::invalid_body("invalid chunk size line")),
            },

            SizeLws => match b {
                b'\t' | b' ' => Ok(SizeLws),
                b';' => Ok(Extension),
                b'\r' => Ok(SizeLf),
                _ => Err(ParseError::invalid_body("invalid chunk size linear white space")),
            },

            // a bare LF inside an extension is rejected rather than treated as a line end
            Extension => match b {
                b'\r' => Ok(SizeLf),
                b'\n' => Err(ParseError::invalid_body("chunk extension contains newline")),
                _ => Ok(Extension),
            },

            SizeLf => match b {
                b'\n' if self.remaining == 0 => Ok(EndCr),
                b'\n' => Ok(Data),
                _ => Err(ParseError::invalid_body("invalid chunk size LF")),
            },

            DataCr => match b {
                b'\r' => Ok(DataLf),
                _ => Err(ParseError::invalid_body("invalid chunk data CR")),
            },

            DataLf => match b {
                b'\n' => Ok(SizeStart),
                _ => Err(ParseError::invalid_body("invalid chunk data LF")),
            },

            Trailer => match b {
                b'\r' => Ok(TrailerLf),
                _ => Ok(Trailer),
            },

            TrailerLf => match b {
                b'\n' => Ok(EndCr),
                _ => Err(ParseError::invalid_body("invalid trailer LF")),
            },

            EndCr => match b {
                b'\r' => Ok(EndLf),
                _ => Ok(Trailer),
            },

            EndLf => match b {
                b'\n' => Ok(End),
                _ => Err(ParseError::invalid_body("invalid chunked end LF")),
            },

            Data | End => Ok(self.state),
        }
    }
}

#[inline]
fn hex_value(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0',
        b'a'..=b'f' => b - b'a' + 10,
        _ => b - b'A' + 10,
    }
}
