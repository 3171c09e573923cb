use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request error: {source}")]
    RequestError {
        #[from]
        source: ParseError,
    },

    #[error("response error: {source}")]
    ResponseError {
        #[from]
        source: SendError,
    },
}

#[derive(Error, Debug)]
pub enum ParseError {
    /// The source reported end-of-stream before the start line, a header line or the
    /// body was complete. `in_message` is false only when nothing of a next message
    /// had been read.
    #[error("source exhausted with {buffered} bytes of an unfinished message buffered")]
    Truncated { buffered: usize, in_message: bool },

    #[error("malformed request: {reason}")]
    MalformedRequest { reason: String },

    #[error("unsupported http method: {method}")]
    UnsupportedMethod { method: String },

    #[error("header size too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeHeader { current_size: usize, max_size: usize },

    #[error("header number exceed the limit {max_num}")]
    TooManyHeaders { max_num: usize },

    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    /// End-of-stream while waiting for a header section.
    pub fn truncated(buffered: usize) -> Self {
        Self::Truncated { buffered, in_message: buffered > 0 }
    }

    /// End-of-stream inside a body.
    pub fn truncated_body(buffered: usize) -> Self {
        Self::Truncated { buffered, in_message: true }
    }

    pub fn malformed<S: ToString>(str: S) -> Self {
        Self::MalformedRequest { reason: str.to_string() }
    }

    pub fn unsupported_method<S: ToString>(method: S) -> Self {
        Self::UnsupportedMethod { method: method.to_string() }
    }

    pub fn too_large_header(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeHeader { current_size, max_size }
    }

    pub fn too_many_headers(max_num: usize) -> Self {
        Self::TooManyHeaders { max_num }
    }

    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    /// Returns true if the source closed cleanly between two messages.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Truncated { in_message: false, .. })
    }

    /// The status code an error page for this failure should carry.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::UnsupportedMethod { .. } => 405,
            Self::TooLargeHeader { .. } | Self::TooManyHeaders { .. } => 431,
            _ => 400,
        }
    }
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("header filter rejected the response: {reason}")]
    Filter { reason: String },

    #[error("sink failure: {source}")]
    SinkFailure {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    pub fn filter<S: ToString>(str: S) -> Self {
        Self::Filter { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::SinkFailure { source: e.into() }
    }
}
