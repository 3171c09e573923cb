//! A parsed HTTP request.
//!
//! [`Message`] is produced by the parser once the whole header section has been
//! read. Everything it exposes is fixed at that point; the body, if any, is read
//! afterwards through [`MessageParser::body`](crate::connection::MessageParser::body).

use http::{Method, Uri, Version};

use crate::protocol::header::{CONNECTION, HOST};
use crate::protocol::{HeaderTable, PayloadSize};

#[derive(Debug, Clone)]
pub struct Message {
    method: Method,
    uri: Uri,
    version: Version,
    headers: HeaderTable,
    payload_size: PayloadSize,
}

impl Message {
    pub(crate) fn new(method: Method, uri: Uri, version: Version, headers: HeaderTable, payload_size: PayloadSize) -> Self {
        Self { method, uri, version, headers, payload_size }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn is_http_get(&self) -> bool {
        self.method == Method::GET
    }

    pub fn is_http_put(&self) -> bool {
        self.method == Method::PUT
    }

    pub fn is_http_post(&self) -> bool {
        self.method == Method::POST
    }

    pub fn is_http_delete(&self) -> bool {
        self.method == Method::DELETE
    }

    pub fn is_http_options(&self) -> bool {
        self.method == Method::OPTIONS
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// The request target as it appeared on the start line.
    pub fn url(&self) -> String {
        self.uri.to_string()
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn query(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Decodes the query string and returns the first value for `key`.
    pub fn query_get(&self, key: &str) -> Option<String> {
        let query = self.uri.query()?;
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query).ok()?;
        pairs.into_iter().find(|(name, _)| name == key).map(|(_, value)| value)
    }

    /// File extension of the last path segment including the dot, e.g. `.flv`.
    pub fn ext(&self) -> Option<&str> {
        let path = self.path();
        let file = &path[path.rfind('/').map_or(0, |i| i + 1)..];
        file.rfind('.').map(|i| &file[i..])
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// The `Host` header value, falling back to the authority of an absolute-form target.
    pub fn host(&self) -> Option<&str> {
        self.headers.get(HOST).or_else(|| self.uri.host())
    }

    pub fn headers(&self) -> &HeaderTable {
        &self.headers
    }

    pub fn content_length(&self) -> Option<u64> {
        self.headers.content_length()
    }

    pub fn is_chunked(&self) -> bool {
        self.payload_size.is_chunked()
    }

    pub fn payload_size(&self) -> PayloadSize {
        self.payload_size
    }

    /// HTTP/1.1 connections persist unless `Connection: close`; HTTP/1.0 only with
    /// an explicit `Connection: keep-alive`.
    pub fn is_keep_alive(&self) -> bool {
        let connection = self.headers.get(CONNECTION).map(str::trim);
        match self.version {
            Version::HTTP_11 => !connection.is_some_and(|v| v.eq_ignore_ascii_case("close")),
            _ => connection.is_some_and(|v| v.eq_ignore_ascii_case("keep-alive")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(target: &str, version: Version, headers: &[(&str, &str)]) -> Message {
        let mut table = HeaderTable::new();
        for (name, value) in headers {
            table.set(*name, *value);
        }
        Message::new(Method::GET, target.parse().unwrap(), version, table, PayloadSize::Empty)
    }

    #[test]
    fn path_query_and_ext() {
        let msg = message("/live/livestream.flv?token=abc&vhost=a%20b", Version::HTTP_11, &[]);

        assert!(msg.is_http_get());
        assert_eq!(msg.path(), "/live/livestream.flv");
        assert_eq!(msg.query(), Some("token=abc&vhost=a%20b"));
        assert_eq!(msg.query_get("token").as_deref(), Some("abc"));
        assert_eq!(msg.query_get("vhost").as_deref(), Some("a b"));
        assert_eq!(msg.query_get("missing"), None);
        assert_eq!(msg.ext(), Some(".flv"));
        assert_eq!(msg.url(), "/live/livestream.flv?token=abc&vhost=a%20b");
    }

    #[test]
    fn ext_ignores_dots_in_directories() {
        let msg = message("/v1.2/streams", Version::HTTP_11, &[]);
        assert_eq!(msg.ext(), None);

        let msg = message("/hls/live.m3u8", Version::HTTP_11, &[]);
        assert_eq!(msg.ext(), Some(".m3u8"));
    }

    #[test]
    fn host_prefers_header() {
        let msg = message("/api/v1/versions", Version::HTTP_11, &[("host", "ossrs.net")]);
        assert_eq!(msg.host(), Some("ossrs.net"));

        let msg = message("http://origin.local/live.flv", Version::HTTP_11, &[]);
        assert_eq!(msg.host(), Some("origin.local"));

        let msg = message("/", Version::HTTP_11, &[]);
        assert_eq!(msg.host(), None);
    }

    #[test]
    fn keep_alive_by_version() {
        assert!(message("/", Version::HTTP_11, &[]).is_keep_alive());
        assert!(!message("/", Version::HTTP_11, &[("Connection", "close")]).is_keep_alive());
        assert!(!message("/", Version::HTTP_10, &[]).is_keep_alive());
        assert!(message("/", Version::HTTP_10, &[("Connection", "Keep-Alive")]).is_keep_alive());
    }
}
