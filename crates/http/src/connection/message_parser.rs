use std::io::{ErrorKind, Read};

use bytes::{Bytes, BytesMut};
use tokio_util::codec::Decoder;
use tracing::{error, trace};

use crate::codec::RequestDecoder;
use crate::protocol::{Frame, Message, ParseError, PayloadItem};

/// Bytes requested from the source per read when no size is configured.
pub const DEFAULT_READ_SIZE: usize = 4 * 1024;

/// Reads requests from a blocking byte source, one [`Message`] per [`parse`](Self::parse).
///
/// The parser owns the accumulation buffer, so bytes read past the end of one
/// message (a pipelined request, or the start of a body) are kept for the next
/// call instead of being handed back to the caller. A header section split
/// across any number of reads, including between the `\r` and `\n` of a line
/// end, parses to the same message as the unsplit bytes.
#[derive(Debug)]
pub struct MessageParser {
    buffer: BytesMut,
    decoder: RequestDecoder,
    read_size: usize,
}

impl MessageParser {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_READ_SIZE)
    }

    /// Creates a parser that asks the source for up to `read_size` bytes per read.
    pub fn with_capacity(read_size: usize) -> Self {
        let read_size = read_size.max(1);
        Self { buffer: BytesMut::with_capacity(read_size), decoder: RequestDecoder::new(), read_size }
    }

    /// Number of bytes read from the source but not consumed yet.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Reads from `source` until a complete header section is buffered and parses it.
    ///
    /// Any body of the previous message that was not read through [`body`](Self::body)
    /// is consumed and dropped first.
    ///
    /// # Errors
    ///
    /// - [`ParseError::Truncated`] when the source is exhausted first;
    ///   [`ParseError::is_closed`] tells a clean close between messages apart
    /// - [`ParseError::UnsupportedMethod`] or [`ParseError::MalformedRequest`] for a bad start line or header
    /// - [`ParseError::Io`] when the source fails
    pub fn parse<R: Read>(&mut self, source: &mut R) -> Result<Message, ParseError> {
        self.skip_body(source)?;

        loop {
            match self.decoder.decode(&mut self.buffer)? {
                Some(Frame::Head((message, payload_size))) => {
                    trace!(method = %message.method(), path = message.path(), ?payload_size, "parsed request head");
                    return Ok(message);
                }
                Some(Frame::Payload(_)) => {
                    error!("expect request head but receive payload");
                    return Err(ParseError::invalid_body("payload received before request head"));
                }
                None => self.fill(source)?,
            }
        }
    }

    /// Returns a reader over the body of the message last returned by [`parse`](Self::parse).
    pub fn body<'a, R: Read>(&'a mut self, source: &'a mut R) -> BodyReader<'a, R> {
        BodyReader { parser: self, source }
    }

    fn next_payload<R: Read>(&mut self, source: &mut R) -> Result<Option<Bytes>, ParseError> {
        if !self.decoder.in_payload() {
            return Ok(None);
        }

        loop {
            match self.decoder.decode(&mut self.buffer)? {
                Some(Frame::Payload(PayloadItem::Chunk(bytes))) => return Ok(Some(bytes)),
                Some(Frame::Payload(PayloadItem::Eof)) => return Ok(None),
                Some(Frame::Head(_)) => {
                    error!("expect payload but receive request head");
                    return Err(ParseError::invalid_body("request head received inside a body"));
                }
                None => match self.fill(source) {
                    Ok(()) => {}
                    Err(ParseError::Truncated { buffered, .. }) => return Err(ParseError::truncated_body(buffered)),
                    Err(e) => return Err(e),
                },
            }
        }
    }

    fn skip_body<R: Read>(&mut self, source: &mut R) -> Result<(), ParseError> {
        let mut skipped = 0;
        while let Some(bytes) = self.next_payload(source)? {
            skipped += bytes.len();
        }

        if skipped > 0 {
            trace!(skipped, "dropped unread request body");
        }
        Ok(())
    }

    /// Appends one read from `source` to the buffer.
    fn fill<R: Read>(&mut self, source: &mut R) -> Result<(), ParseError> {
        let len = self.buffer.len();
        self.buffer.resize(len + self.read_size, 0);

        loop {
            match source.read(&mut self.buffer[len..]) {
                Ok(0) => {
                    self.buffer.truncate(len);
                    trace!(buffered = len, "source exhausted");
                    return Err(ParseError::truncated(len));
                }
                Ok(n) => {
                    self.buffer.truncate(len + n);
                    trace!(read = n, buffered = len + n, "read from source");
                    return Ok(());
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                    self.buffer.truncate(len);
                    return Err(ParseError::truncated(len));
                }
                Err(e) => {
                    self.buffer.truncate(len);
                    error!(cause = %e, "read from source failed");
                    return Err(ParseError::io(e));
                }
            }
        }
    }
}

impl Default for MessageParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads the body of the last parsed message.
///
/// Content-length bodies stop after exactly that many bytes; chunked bodies are
/// de-framed and stop at the zero-size chunk. A message without a body yields
/// nothing. A source that ends inside the body gives [`ParseError::Truncated`].
#[derive(Debug)]
pub struct BodyReader<'a, R> {
    parser: &'a mut MessageParser,
    source: &'a mut R,
}

impl<R: Read> BodyReader<'_, R> {
    /// Returns the next piece of body data, or `None` once the body is complete.
    pub fn next_chunk(&mut self) -> Result<Option<Bytes>, ParseError> {
        self.parser.next_payload(self.source)
    }

    /// Reads the rest of the body into one buffer.
    pub fn read_all(mut self) -> Result<Bytes, ParseError> {
        let mut body = BytesMut::new();
        while let Some(bytes) = self.next_chunk()? {
            body.extend_from_slice(&bytes);
        }
        Ok(body.freeze())
    }
}
