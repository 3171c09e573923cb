//! Byte-level codecs for requests and responses.
//!
//! - [`RequestDecoder`]: decodes a request header section and then its payload,
//!   built from the header and body decoders
//! - [`ResponseEncoder`]: encodes a response status line, header block and payload
//!
//! Both work on [`bytes::BytesMut`] buffers through the `tokio_util` codec traits,
//! and are driven synchronously by [`crate::connection`].

mod body;
mod header;
mod request_decoder;
mod response_encoder;

pub use header::{MAX_HEADER_BYTES, MAX_HEADER_NUM};
pub use request_decoder::RequestDecoder;
pub use response_encoder::{ResponseEncoder, ResponseFrame};
