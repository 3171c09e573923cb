//! Response encoder pairing the header encoder with a payload encoder.

use crate::codec::body::PayloadEncoder;
use crate::codec::header::HeaderEncoder;
use crate::protocol::{Frame, HeaderTable, PayloadSize, SendError};
use bytes::{Buf, BytesMut};
use tokio_util::codec::Encoder;
use tracing::error;

/// A response frame: the head is the status code, the header table and the body framing.
pub type ResponseFrame<'a, D> = Frame<(u16, &'a HeaderTable, PayloadSize), D>;

/// Encodes a [`Frame::Head`] carrying `(status, headers, payload size)` and then
/// the payload items of that response.
///
/// The payload size picks the body framing: raw bytes bounded by a length,
/// chunked framing, or no body at all.
#[derive(Debug, Default)]
pub struct ResponseEncoder {
    header_encoder: HeaderEncoder,
    payload_encoder: Option<PayloadEncoder>,
}

impl ResponseEncoder {
    pub fn new() -> Self {
        Default::default()
    }

    /// Whether the head has been encoded and the payload is not finished yet.
    pub fn in_payload(&self) -> bool {
        self.payload_encoder.is_some()
    }
}

impl<'a, D: Buf> Encoder<ResponseFrame<'a, D>> for ResponseEncoder {
    type Error = SendError;

    fn encode(&mut self, item: ResponseFrame<'a, D>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            Frame::Head((status, headers, payload_size)) => {
                if self.payload_encoder.is_some() {
                    error!("expect payload item but receive response head");
                    return Err(SendError::invalid_body("response head already sent"));
                }

                self.header_encoder.encode((status, headers), dst)?;
                self.payload_encoder = Some(payload_size.into());
                Ok(())
            }

            Frame::Payload(payload_item) => {
                let Some(payload_encoder) = &mut self.payload_encoder else {
                    error!("expect response head but receive payload item");
                    return Err(SendError::invalid_body("response head not sent"));
                };

                let is_eof = payload_item.is_eof();
                let result = payload_encoder.encode(payload_item, dst);
                if is_eof {
                    self.payload_encoder.take();
                }

                result
            }
        }
    }
}
