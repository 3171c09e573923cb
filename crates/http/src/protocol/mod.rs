//! Protocol types shared by the parser and the response writer.
//!
//! - [`HeaderTable`]: ordered, case-insensitive header fields, one entry per name
//! - [`Message`]: a parsed request head with its derived body framing
//! - [`Frame`], [`PayloadItem`], [`PayloadSize`]: units exchanged with the codecs
//! - [`status`]: reason phrases and which statuses may carry a body
//! - [`detect_content_type`]: media type sniffing for response bodies
//! - [`HttpError`], [`ParseError`], [`SendError`]: error taxonomy

pub mod header;
pub use header::HeaderTable;

mod message;
pub use message::Message;

mod frame;
pub use frame::Frame;
pub use frame::PayloadItem;
pub use frame::PayloadSize;

pub mod status;
pub use status::{body_allowed, reason_phrase};

mod sniff;
pub use sniff::detect_content_type;

mod error;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;
