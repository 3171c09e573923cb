//! Request body decoding and response body encoding.
//!
//! ## Decoders
//! - [`PayloadDecoder`]: dispatches to a content-length or chunked decoder
//!
//! ## Encoders
//! - [`PayloadEncoder`]: dispatches to a content-length or chunked encoder

mod chunked_decoder;
mod chunked_encoder;
mod length_decoder;
mod length_encoder;
mod payload_decoder;
mod payload_encoder;

pub use payload_decoder::PayloadDecoder;
pub use payload_encoder::PayloadEncoder;
