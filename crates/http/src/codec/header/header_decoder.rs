//! HTTP header decoder implementation for parsing HTTP request headers
//!
//! This module turns the start line and header section of a request into a
//! [`Message`]. Input may arrive in arbitrarily small pieces: the decoder keeps a
//! scan cursor so that each call only inspects bytes it has not looked at before,
//! and it reports `Ok(None)` until the blank line ending the header section has
//! been seen.
//!
//! # Limits
//!
//! - Maximum number of headers: 64
//! - Maximum header size: 8KB
//! - Only supports HTTP/1.0 and HTTP/1.1
//!
//! # Implementation Details
//!
//! The decoder works in multiple stages:
//!
//! 1. Scan for the end of the header section, resuming where the last call stopped
//! 2. Split the complete header section off the source buffer
//! 3. Tokenize it with `httparse`
//! 4. Collect the fields into a [`HeaderTable`], later names overriding earlier ones
//! 5. Determine payload delimitation based on the headers

use bytes::{Buf, BytesMut};
use http::{Method, Uri, Version};
use httparse::{Error, Status};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::ensure;
use crate::protocol::header::{CONTENT_LENGTH, TRANSFER_ENCODING};
use crate::protocol::{HeaderTable, Message, ParseError, PayloadSize};

/// Maximum number of headers allowed in a request
pub const MAX_HEADER_NUM: usize = 64;

/// Maximum size in bytes allowed for the entire header section
pub const MAX_HEADER_BYTES: usize = 8 * 1024;

/// Decoder for HTTP request headers implementing the [`Decoder`] trait.
///
/// `scanned` is the number of buffered bytes already searched for the end of the
/// header section. It is reset whenever a header section is split off.
#[derive(Debug, Default)]
pub struct HeaderDecoder {
    scanned: usize,
}

impl Decoder for HeaderDecoder {
    type Item = (Message, PayloadSize);
    type Error = ParseError;

    /// Attempts to decode HTTP headers from the provided bytes buffer.
    ///
    /// # Returns
    ///
    /// - `Ok(Some((message, payload_size)))` if a complete header was successfully parsed
    /// - `Ok(None)` if more data is needed
    /// - `Err(ParseError)` if parsing failed
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if:
    /// - The number of headers exceeds `MAX_HEADER_NUM`
    /// - The total header size exceeds `MAX_HEADER_BYTES`
    /// - The start line or a header line is malformed
    /// - The method is not one we serve
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.scanned == 0 {
            // empty lines ahead of a request line are ignored
            let blank = src.iter().take_while(|b| matches!(b, b'\r' | b'\n')).count();
            src.advance(blank);
        }

        let Some(header_end) = self.find_header_end(src) else {
            ensure!(src.len() <= MAX_HEADER_BYTES, ParseError::too_large_header(src.len(), MAX_HEADER_BYTES));
            return Ok(None);
        };

        trace!(header_size = header_end, "found end of header section");
        ensure!(header_end <= MAX_HEADER_BYTES, ParseError::too_large_header(header_end, MAX_HEADER_BYTES));

        let header_bytes = src.split_to(header_end);
        self.scanned = 0;

        let message = parse_message(&header_bytes)?;
        let payload_size = message.payload_size();
        Ok(Some((message, payload_size)))
    }
}

impl HeaderDecoder {
    /// Returns the offset just past the blank line ending the header section.
    ///
    /// Both `\r\n` and bare `\n` line endings are accepted. A terminator split across
    /// two calls is found because scanning resumes two bytes before the old end.
    fn find_header_end(&mut self, src: &[u8]) -> Option<usize> {
        let mut from = self.scanned.saturating_sub(2);

        while let Some(pos) = src[from..].iter().position(|b| *b == b'\n') {
            let lf = from + pos;
            match &src[lf + 1..] {
                [b'\n', ..] => return Some(lf + 2),
                [b'\r', b'\n', ..] => return Some(lf + 3),
                [] | [b'\r'] => break,
                _ => from = lf + 1,
            }
        }

        self.scanned = src.len();
        None
    }
}

/// Builds a [`Message`] from a complete header section.
fn parse_message(bytes: &[u8]) -> Result<Message, ParseError> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];
    let mut req = httparse::Request::new(&mut headers);

    let status = req.parse(bytes).map_err(|e| match e {
        Error::TooManyHeaders => ParseError::too_many_headers(MAX_HEADER_NUM),
        e => ParseError::malformed(e),
    })?;
    ensure!(matches!(status, Status::Complete(_)), ParseError::malformed("incomplete header section"));

    let method = parse_method(req.method.ok_or_else(|| ParseError::malformed("missing method"))?)?;

    let version = match req.version {
        Some(0) => Version::HTTP_10,
        Some(1) => Version::HTTP_11,
        v => return Err(ParseError::malformed(format!("invalid http version: {v:?}"))),
    };

    let uri = req
        .path
        .ok_or_else(|| ParseError::malformed("missing request target"))?
        .parse::<Uri>()
        .map_err(|e| ParseError::malformed(format!("invalid request target: {e}")))?;

    let mut table = HeaderTable::with_capacity(req.headers.len());
    for header in req.headers.iter() {
        let value = std::str::from_utf8(header.value)
            .map_err(|_| ParseError::malformed(format!("header {} is not valid utf-8", header.name)))?;
        table.set(header.name, value);
    }

    let payload_size = parse_payload(&table)?;
    Ok(Message::new(method, uri, version, table, payload_size))
}

fn parse_method(token: &str) -> Result<Method, ParseError> {
    match token {
        "GET" => Ok(Method::GET),
        "POST" => Ok(Method::POST),
        "PUT" => Ok(Method::PUT),
        "DELETE" => Ok(Method::DELETE),
        "HEAD" => Ok(Method::HEAD),
        "OPTIONS" => Ok(Method::OPTIONS),
        "PATCH" => Ok(Method::PATCH),
        "TRACE" => Ok(Method::TRACE),
        "CONNECT" => Ok(Method::CONNECT),
        other => Err(ParseError::unsupported_method(other)),
    }
}

/// Determines how the body following the header section is delimited.
///
/// - A `Content-Length` bounds the body to that many bytes
/// - Otherwise a `Transfer-Encoding` ending in `chunked` selects chunked decoding
/// - Otherwise there is no body
///
/// A `Content-Length` that is present but not a run of ASCII digits (negative,
/// signed or garbage) is rejected; it does not fall through to the next rule.
///
/// # Errors
///
/// Returns `ParseError::MalformedRequest` for such a `Content-Length`.
fn parse_payload(headers: &HeaderTable) -> Result<PayloadSize, ParseError> {
    if let Some(length) = headers.content_length() {
        return Ok(PayloadSize::Length(length));
    }

    ensure!(!headers.contains(CONTENT_LENGTH), ParseError::malformed("content-length is not a non-negative integer"));

    if is_chunked(headers.get(TRANSFER_ENCODING)) {
        Ok(PayloadSize::Chunked)
    } else {
        Ok(PayloadSize::Empty)
    }
}

/// Checks if the Transfer-Encoding header indicates chunked encoding.
///
/// According to RFC 7230, chunked must be the last encoding if present.
fn is_chunked(header_value: Option<&str>) -> bool {
    header_value
        .and_then(|value| value.rsplit(',').next())
        .is_some_and(|last| last.trim().eq_ignore_ascii_case("chunked"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn check_is_chunked() {
        assert!(!is_chunked(None));
        assert!(is_chunked(Some("chunked")));
        assert!(is_chunked(Some("gzip, chunked")));
        assert!(is_chunked(Some("gzip, Chunked ")));
        assert!(!is_chunked(Some("chunked, gzip")));
        assert!(!is_chunked(Some("gzip")));
    }

    #[test]
    fn test_bytes_mut_lens() {
        let str = indoc! {r##"
        POST /index.html HTTP/1.1
        Host: 127.0.0.1:8080
        User-Agent: curl/7.79.1
        Content-Length: 3

        123"##};

        let mut bytes = BytesMut::from(str);

        let mut header_decoder = HeaderDecoder::default();

        let result = header_decoder.decode(&mut bytes).unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().1, PayloadSize::Length(3));

        assert_eq!(bytes.len(), 3);
        assert_eq!(&bytes[..], &b"123"[..]);
    }

    #[test]
    fn from_curl() {
        let str = indoc! {r##"
        GET /index.html HTTP/1.1
        Host: 127.0.0.1:8080
        User-Agent: curl/7.79.1
        Accept: */*

        "##};

        let mut buf = BytesMut::from(str);

        let (message, payload_size) = HeaderDecoder::default().decode(&mut buf).unwrap().unwrap();

        assert!(payload_size.is_empty());
        assert!(buf.is_empty());

        assert_eq!(message.method(), &Method::GET);
        assert_eq!(message.version(), Version::HTTP_11);
        assert_eq!(message.uri().host(), None);
        assert_eq!(message.path(), "/index.html");
        assert_eq!(message.query(), None);
        assert_eq!(message.host(), Some("127.0.0.1:8080"));

        assert_eq!(message.headers().count(), 3);
        assert_eq!(message.headers().get("accept"), Some("*/*"));
        assert_eq!(message.headers().get("USER-AGENT"), Some("curl/7.79.1"));
    }

    #[test]
    fn from_edge() {
        let str = indoc! {r##"
        GET /index/?a=1&b=2&a=3 HTTP/1.1
        Host: 127.0.0.1:8080
        Connection: keep-alive
        Cache-Control: max-age=0
        sec-ch-ua: "#Not_A Brand";v="99", "Microsoft Edge";v="109", "Chromium";v="109"
        sec-ch-ua-mobile: ?0
        sec-ch-ua-platform: "macOS"
        Upgrade-Insecure-Requests: 1
        User-Agent: Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/109.0.0.0 Safari/537.36 Edg/109.0.1518.52
        Accept: text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.9
        Sec-Fetch-Site: none
        Sec-Fetch-Mode: navigate
        Sec-Fetch-User: ?1
        Sec-Fetch-Dest: document
        Accept-Encoding: gzip, deflate, br
        Accept-Language: zh-CN,zh;q=0.9,en-US;q=0.8,en;q=0.7

        "##};

        let mut buf = BytesMut::from(str);

        let (message, payload_size) = HeaderDecoder::default().decode(&mut buf).unwrap().unwrap();

        assert!(payload_size.is_empty());

        assert_eq!(message.method(), &Method::GET);
        assert_eq!(message.path(), "/index/");
        assert_eq!(message.query(), Some("a=1&b=2&a=3"));
        assert_eq!(message.query_get("a").as_deref(), Some("1"));

        assert_eq!(message.headers().count(), 15);

        let headers = message.headers();
        assert_eq!(headers.get("Connection"), Some("keep-alive"));
        assert_eq!(headers.get("Cache-Control"), Some("max-age=0"));
        assert_eq!(headers.get("sec-ch-ua"), Some(r##""#Not_A Brand";v="99", "Microsoft Edge";v="109", "Chromium";v="109""##));
        assert_eq!(headers.get("sec-ch-ua-platform"), Some("\"macOS\""));
        assert_eq!(headers.get("Sec-Fetch-User"), Some("?1"));
        assert_eq!(headers.get("Accept-Encoding"), Some("gzip, deflate, br"));
        assert_eq!(headers.get("Accept-Language"), Some("zh-CN,zh;q=0.9,en-US;q=0.8,en;q=0.7"));

        // serialization keeps the order of the request
        let names: Vec<_> = headers.iter().map(|(name, _)| name).take(3).collect();
        assert_eq!(names, ["Host", "Connection", "Cache-Control"]);
    }

    #[test]
    fn one_byte_at_a_time() {
        let request = b"GET /api/v1/versions HTTP/1.1\r\nUser-Agent: curl/7.54.0\r\nHost: ossrs.net\r\n\r\n";

        let mut decoder = HeaderDecoder::default();
        let mut buf = BytesMut::new();
        let mut decoded = None;

        for (i, b) in request.iter().enumerate() {
            buf.extend_from_slice(&[*b]);
            if let Some(item) = decoder.decode(&mut buf).unwrap() {
                assert_eq!(i, request.len() - 1);
                decoded = Some(item);
            }
        }

        let (message, _) = decoded.unwrap();
        assert_eq!(message.path(), "/api/v1/versions");
        assert_eq!(message.host(), Some("ossrs.net"));
        assert_eq!(message.headers().get("User-Agent"), Some("curl/7.54.0"));
    }

    #[test]
    fn scan_resumes_after_partial() {
        let mut decoder = HeaderDecoder::default();
        let mut buf = BytesMut::from(&b"GET / HTTP/1.1\r\nHost: a\r\n\r"[..]);

        assert!(decoder.decode(&mut buf).unwrap().is_none());
        assert_eq!(decoder.scanned, buf.len());

        buf.extend_from_slice(b"\nGET /next");
        let (message, _) = decoder.decode(&mut buf).unwrap().unwrap();
        assert_eq!(message.host(), Some("a"));
        assert_eq!(decoder.scanned, 0);
        assert_eq!(&buf[..], b"GET /next");
    }

    #[test]
    fn repeated_header_collapses_to_last() {
        let mut buf = BytesMut::from(&b"GET / HTTP/1.1\r\nX-Token: one\r\nx-token: two\r\n\r\n"[..]);

        let (message, _) = HeaderDecoder::default().decode(&mut buf).unwrap().unwrap();
        assert_eq!(message.headers().count(), 1);
        assert_eq!(message.headers().get("X-Token"), Some("two"));
    }

    #[test]
    fn leading_blank_lines_are_skipped() {
        let mut buf = BytesMut::from(&b"\r\n\r\nGET / HTTP/1.1\r\nHost: a\r\n\r\n"[..]);

        let (message, _) = HeaderDecoder::default().decode(&mut buf).unwrap().unwrap();
        assert_eq!(message.path(), "/");
        assert!(buf.is_empty());
    }

    #[test]
    fn unsupported_method() {
        let mut buf = BytesMut::from(&b"BREW /pot HTTP/1.1\r\nHost: a\r\n\r\n"[..]);

        let err = HeaderDecoder::default().decode(&mut buf).unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedMethod { ref method } if method == "BREW"));
    }

    #[test]
    fn malformed_lines() {
        let mut buf = BytesMut::from(&b"GET /\r\n\r\n"[..]);
        let err = HeaderDecoder::default().decode(&mut buf).unwrap_err();
        assert!(matches!(err, ParseError::MalformedRequest { .. }));

        let mut buf = BytesMut::from(&b"GET / HTTP/1.1\r\nno colon here\r\n\r\n"[..]);
        let err = HeaderDecoder::default().decode(&mut buf).unwrap_err();
        assert!(matches!(err, ParseError::MalformedRequest { .. }));

        let mut buf = BytesMut::from(&b"POST / HTTP/1.1\r\nContent-Length: ten\r\n\r\n"[..]);
        let err = HeaderDecoder::default().decode(&mut buf).unwrap_err();
        assert!(matches!(err, ParseError::MalformedRequest { .. }));
    }

    #[test]
    fn payload_policy() {
        let mut buf = BytesMut::from(&b"POST /publish HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n"[..]);
        let (_, payload_size) = HeaderDecoder::default().decode(&mut buf).unwrap().unwrap();
        assert_eq!(payload_size, PayloadSize::Chunked);

        // a content length takes precedence over chunked
        let mut buf = BytesMut::from(&b"POST /publish HTTP/1.1\r\nTransfer-Encoding: chunked\r\nContent-Length: 4\r\n\r\n"[..]);
        let (_, payload_size) = HeaderDecoder::default().decode(&mut buf).unwrap().unwrap();
        assert_eq!(payload_size, PayloadSize::Length(4));

        let mut buf = BytesMut::from(&b"GET /live.flv HTTP/1.1\r\n\r\n"[..]);
        let (_, payload_size) = HeaderDecoder::default().decode(&mut buf).unwrap().unwrap();
        assert_eq!(payload_size, PayloadSize::Empty);
    }

    #[test]
    fn too_large_header() {
        let mut buf = BytesMut::from(&b"GET / HTTP/1.1\r\nX-Pad: "[..]);
        buf.extend_from_slice(&[b'a'; MAX_HEADER_BYTES]);

        let err = HeaderDecoder::default().decode(&mut buf).unwrap_err();
        assert!(matches!(err, ParseError::TooLargeHeader { .. }));
    }

    #[test]
    fn signed_content_length_is_rejected() {
        for value in ["-1", "+5"] {
            let mut buf = BytesMut::from(format!("POST /publish HTTP/1.1\r\nContent-Length: {value}\r\n\r\nhello").as_bytes());
            let err = HeaderDecoder::default().decode(&mut buf).unwrap_err();
            assert!(matches!(err, ParseError::MalformedRequest { .. }), "{value}: {err}");
        }
    }

    #[test]
    fn too_many_headers() {
        let mut request = String::from("GET /live/livestream.flv HTTP/1.1\r\n");
        for i in 0..=MAX_HEADER_NUM {
            request.push_str(&format!("X-Header-{i}: {i}\r\n"));
        }
        request.push_str("\r\n");

        let mut buf = BytesMut::from(request.as_bytes());
        let err = HeaderDecoder::default().decode(&mut buf).unwrap_err();
        assert!(matches!(err, ParseError::TooManyHeaders { max_num: MAX_HEADER_NUM }));
        assert_eq!(err.status_code(), 431);
    }
}
