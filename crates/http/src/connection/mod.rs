//! Blocking, per-connection request parsing and response writing.
//!
//! - [`MessageParser`]: reads one request head at a time from a [`std::io::Read`]
//!   source, with [`BodyReader`] for the body
//! - [`ResponseWriter`] and [`HttpResponseWriter`]: build a response and encode it
//!   onto a [`std::io::Write`] sink
//! - [`write_error`]: minimal plain-text error responses
//!
//! One connection is served by one thread; nothing here is shared between threads.

mod error_responder;
mod message_parser;
mod response_writer;

pub use error_responder::write_error;
pub use message_parser::{BodyReader, MessageParser, DEFAULT_READ_SIZE};
pub use response_writer::{HttpResponseWriter, ResponseWriter, DEFAULT_SERVER, DEFAULT_WRITE_BUFFER};
