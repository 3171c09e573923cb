//! Streaming request decoder.
//!
//! [`RequestDecoder`] yields one [`Frame::Head`] per request followed by the
//! request's payload items, the last of which is always [`PayloadItem::Eof`].
//!
//! ```
//! use media_http::codec::RequestDecoder;
//! use media_http::protocol::Frame;
//! use tokio_util::codec::Decoder;
//! use bytes::BytesMut;
//!
//! let mut decoder = RequestDecoder::new();
//! let mut buffer = BytesMut::from(&b"GET /live/a.flv HTTP/1.1\r\nHost: x\r\n\r\n"[..]);
//! let frame = decoder.decode(&mut buffer).unwrap().unwrap();
//! assert!(matches!(frame, Frame::Head((ref message, _)) if message.path() == "/live/a.flv"));
//! ```

use crate::codec::body::PayloadDecoder;
use crate::codec::header::HeaderDecoder;
use crate::protocol::{Frame, Message, ParseError, PayloadItem, PayloadSize};
use bytes::BytesMut;
use tokio_util::codec::Decoder;

/// A decoder for HTTP requests that handles both headers and payload
///
/// The state lives in `payload_decoder`:
/// - `None`: parsing a header section
/// - `Some(PayloadDecoder)`: parsing the payload of the last header section
#[derive(Debug, Default)]
pub struct RequestDecoder {
    header_decoder: HeaderDecoder,
    payload_decoder: Option<PayloadDecoder>,
}

impl RequestDecoder {
    pub fn new() -> Self {
        Default::default()
    }

    /// Whether the decoder is between a header section and the end of its payload.
    pub fn in_payload(&self) -> bool {
        self.payload_decoder.is_some()
    }
}

impl Decoder for RequestDecoder {
    type Item = Frame<(Message, PayloadSize)>;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(payload_decoder) = &mut self.payload_decoder {
            let frame = match payload_decoder.decode(src)? {
                Some(item @ PayloadItem::Chunk(_)) => Some(Frame::Payload(item)),
                Some(item @ PayloadItem::Eof) => {
                    self.payload_decoder.take();
                    Some(Frame::Payload(item))
                }
                None => None,
            };

            return Ok(frame);
        }

        let frame = match self.header_decoder.decode(src)? {
            Some((message, payload_size)) => {
                self.payload_decoder = Some(payload_size.into());
                Some(Frame::Head((message, payload_size)))
            }
            None => None,
        };

        Ok(frame)
    }
}
