//! HTTP header encoder implementation for serializing HTTP response headers
//!
//! This module writes the status line and header block of a response:
//! `HTTP/1.1 <code> <reason>\r\n`, one `Name: Value\r\n` line per header table
//! entry in table order, and the blank line that ends the header section.
//! Deciding which headers a response carries is left to the response writer.

use crate::protocol::status::reason_phrase;
use crate::protocol::{HeaderTable, SendError};

use bytes::{BufMut, BytesMut};

use std::io;
use std::io::Write;
use tokio_util::codec::Encoder;

/// Initial buffer size allocated for header serialization
const INIT_HEADER_SIZE: usize = 4 * 1024;

/// Encoder for HTTP response headers implementing the [`Encoder`] trait.
#[derive(Debug, Default)]
pub struct HeaderEncoder;

impl Encoder<(u16, &HeaderTable)> for HeaderEncoder {
    type Error = SendError;

    /// Encodes the status line and headers into the provided bytes buffer.
    ///
    /// Codes without a catalogued reason are written with `Status Unknown`.
    fn encode(&mut self, item: (u16, &HeaderTable), dst: &mut BytesMut) -> Result<(), Self::Error> {
        let (status, headers) = item;

        dst.reserve(INIT_HEADER_SIZE);
        write!(FastWrite(dst), "HTTP/1.1 {} {}\r\n", status, reason_phrase(status))?;

        headers.write_to(dst);
        dst.put_slice(b"\r\n");
        Ok(())
    }
}

/// Fast writer implementation for writing to BytesMut.
///
/// This is an optimization to avoid unnecessary bounds checking when writing
/// to the bytes buffer, since we've already reserved enough space.
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
