use std::fmt;
use std::io::{IoSlice, Write};

use bytes::{Bytes, BytesMut};
use tokio_util::codec::Encoder;
use tracing::{error, trace, warn};

use crate::codec::{ResponseEncoder, ResponseFrame};
use crate::filter::HeaderFilter;
use crate::protocol::header::{CONNECTION, CONTENT_LENGTH, SERVER, TRANSFER_ENCODING};
use crate::protocol::{body_allowed, detect_content_type, HeaderTable, PayloadItem, PayloadSize, SendError};

/// `Server` value used when the caller sets none.
pub const DEFAULT_SERVER: &str = concat!("media-http/", env!("CARGO_PKG_VERSION"));

/// Initial size of the buffer a response is encoded into before it is flushed.
pub const DEFAULT_WRITE_BUFFER: usize = 4 * 1024;

/// Sends one response.
///
/// Headers are collected in [`header`](Self::header) and go out together with the
/// first body bytes, or at [`final_request`](Self::final_request) when there are none.
pub trait ResponseWriter {
    /// The pending header table. Changes made after [`write_header`](Self::write_header)
    /// are ignored.
    fn header(&mut self) -> &mut HeaderTable;

    /// Latches the status code and a copy of the pending table, whose `Content-Length`
    /// decides the body framing.
    ///
    /// Only the first call counts.
    fn write_header(&mut self, status: u16);

    /// Writes body bytes, sending the header block first if it is still pending.
    ///
    /// A status of 200 is latched when [`write_header`](Self::write_header) was never called.
    fn write(&mut self, data: &[u8]) -> Result<usize, SendError>;

    /// Vectored [`write`](Self::write). Returns the number of body bytes written.
    fn writev(&mut self, bufs: &[IoSlice<'_>]) -> Result<usize, SendError>;

    /// Completes the response: sends a pending header block, terminates a chunked
    /// body and flushes the sink.
    fn final_request(&mut self) -> Result<(), SendError>;
}

/// A [`ResponseWriter`] encoding HTTP/1.1 onto a blocking sink.
///
/// When the header block is sent the writer fills in what the caller left out:
///
/// - `Content-Type`, sniffed from the first body bytes when the status allows a body
/// - `Server`
/// - `Transfer-Encoding: chunked` when no `Content-Length` was latched and the status allows a body
/// - `Connection: Keep-Alive`
///
/// and then runs the header filter, if any.
pub struct HttpResponseWriter<W> {
    sink: W,
    encoder: ResponseEncoder,
    buffer: BytesMut,
    headers: HeaderTable,
    latched: Option<HeaderTable>,
    server: String,
    filter: Option<Box<dyn HeaderFilter + Send>>,
    status: u16,
    header_sent: bool,
}

impl<W: Write> HttpResponseWriter<W> {
    pub fn new(sink: W) -> Self {
        Self::with_capacity(sink, DEFAULT_WRITE_BUFFER)
    }

    pub fn with_capacity(sink: W, capacity: usize) -> Self {
        Self {
            sink,
            encoder: ResponseEncoder::new(),
            buffer: BytesMut::with_capacity(capacity),
            headers: HeaderTable::new(),
            latched: None,
            server: DEFAULT_SERVER.to_string(),
            filter: None,
            status: 200,
            header_sent: false,
        }
    }

    /// Sets the `Server` value written when the header table has none.
    pub fn with_server<S: Into<String>>(mut self, server: S) -> Self {
        self.server = server.into();
        self
    }

    /// Installs the filter run once, right before the header block is encoded.
    pub fn set_filter<F: HeaderFilter + Send + 'static>(&mut self, filter: F) {
        self.filter = Some(Box::new(filter));
    }

    /// The latched status code, 200 until [`write_header`](ResponseWriter::write_header) is called.
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_header_sent(&self) -> bool {
        self.header_sent
    }

    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    pub fn into_inner(self) -> W {
        self.sink
    }

    fn send_header(&mut self, data: &[u8]) -> Result<(), SendError> {
        if self.header_sent {
            return Ok(());
        }

        if self.latched.is_none() {
            self.write_header(200);
        }
        let headers = self.latched.get_or_insert_with(HeaderTable::new);

        let with_body = body_allowed(self.status);
        if with_body && !data.is_empty() && headers.content_type().is_none() {
            headers.set_content_type(detect_content_type(data));
        }

        if !headers.contains(SERVER) {
            headers.set(SERVER, self.server.as_str());
        }

        let payload_size = match headers.content_length() {
            Some(length) => PayloadSize::Length(length),
            None if with_body => {
                headers.del(CONTENT_LENGTH);
                headers.set(TRANSFER_ENCODING, "chunked");
                PayloadSize::Chunked
            }
            None => PayloadSize::Empty,
        };

        if !headers.contains(CONNECTION) {
            headers.set(CONNECTION, "Keep-Alive");
        }

        if let Some(filter) = &mut self.filter {
            filter.filter(headers).inspect_err(|e| error!(cause = %e, "header filter failed"))?;
        }

        // never retried, even when encoding fails
        self.header_sent = true;
        trace!(status = self.status, ?payload_size, "sending response head");
        self.encoder.encode(ResponseFrame::<Bytes>::Head((self.status, &*headers, payload_size)), &mut self.buffer)
    }

    fn encode_chunk(&mut self, data: &[u8]) -> Result<(), SendError> {
        self.encoder.encode(ResponseFrame::Payload(PayloadItem::Chunk(data)), &mut self.buffer)
    }

    fn flush_buffer(&mut self) -> Result<(), SendError> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let result = self.sink.write_all(&self.buffer);
        self.buffer.clear();
        result.map_err(|e| {
            error!(cause = %e, "write response to sink failed");
            SendError::io(e)
        })
    }
}

impl<W> fmt::Debug for HttpResponseWriter<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponseWriter")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("latched", &self.latched)
            .field("header_sent", &self.header_sent)
            .field("has_filter", &self.filter.is_some())
            .finish_non_exhaustive()
    }
}

impl<W: Write> ResponseWriter for HttpResponseWriter<W> {
    fn header(&mut self) -> &mut HeaderTable {
        &mut self.headers
    }

    fn write_header(&mut self, status: u16) {
        if self.latched.is_some() {
            warn!(status, latched = self.status, "response status already written, ignored");
            return;
        }

        self.status = status;
        self.latched = Some(self.headers.clone());
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, SendError> {
        self.send_header(data)?;
        self.encode_chunk(data)?;
        self.flush_buffer()?;
        Ok(data.len())
    }

    fn writev(&mut self, bufs: &[IoSlice<'_>]) -> Result<usize, SendError> {
        let first = bufs.iter().find(|buf| !buf.is_empty()).map_or(&[][..], |buf| &buf[..]);
        self.send_header(first)?;

        let total = bufs.iter().map(|buf| buf.len()).sum();
        let mut data = BytesMut::with_capacity(total);
        for buf in bufs {
            data.extend_from_slice(buf);
        }

        self.encode_chunk(&data)?;
        self.flush_buffer()?;
        Ok(total)
    }

    fn final_request(&mut self) -> Result<(), SendError> {
        self.send_header(&[])?;

        if self.encoder.in_payload() {
            self.encoder.encode(ResponseFrame::<Bytes>::Payload(PayloadItem::Eof), &mut self.buffer)?;
        }

        self.flush_buffer()?;
        self.sink.flush().map_err(SendError::io)
    }
}
