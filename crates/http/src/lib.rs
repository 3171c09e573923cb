//! The HTTP/1.1 layer of a streaming media server.
//!
//! This crate parses requests incrementally from a blocking byte source and writes
//! responses to a blocking byte sink. It is meant to sit under an API or
//! HTTP-FLV/HLS front end that owns the sockets and one thread per connection.
//!
//! # Example
//!
//! ```no_run
//! use std::net::TcpListener;
//! use media_http::connection::{write_error, HttpResponseWriter, MessageParser, ResponseWriter};
//!
//! let listener = TcpListener::bind("127.0.0.1:8080").unwrap();
//! let (mut stream, _) = listener.accept().unwrap();
//! let mut parser = MessageParser::new();
//!
//! loop {
//!     let mut writer = HttpResponseWriter::new(stream.try_clone().unwrap());
//!     match parser.parse(&mut stream) {
//!         Ok(message) if message.path() == "/api/v1/versions" => {
//!             writer.header().set_content_type("application/json");
//!             writer.write(br#"{"code":0}"#).unwrap();
//!             writer.final_request().unwrap();
//!         }
//!         Ok(_) => write_error(&mut writer, 404).unwrap(),
//!         Err(e) if e.is_closed() => break,
//!         Err(e) => {
//!             write_error(&mut writer, e.status_code()).unwrap();
//!             break;
//!         }
//!     }
//! }
//! ```
//!
//! # Architecture
//!
//! - [`protocol`]: header table, parsed message, status catalog, content sniffing, errors
//! - [`codec`]: `tokio_util` decoders and encoders over `BytesMut`
//! - [`connection`]: the blocking parser and response writer driving the codecs
//! - [`filter`]: the header filter hook applied before a response head is sent
//!
//! # Limitations
//!
//! - HTTP/1.x requests only, no TLS
//! - Maximum header size: 8KB
//! - Maximum number of headers: 64

pub mod codec;
pub mod connection;
pub mod filter;
pub mod protocol;

mod utils;
pub(crate) use utils::ensure;
