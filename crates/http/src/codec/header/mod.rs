//! Header section codecs.
//!
//! - [`HeaderDecoder`]: finds the end of a request header section across partial
//!   reads and parses it into a [`Message`](crate::protocol::Message)
//! - [`HeaderEncoder`]: writes a response status line and header block

mod header_decoder;
mod header_encoder;

pub use header_decoder::{HeaderDecoder, MAX_HEADER_BYTES, MAX_HEADER_NUM};
pub use header_encoder::HeaderEncoder;
