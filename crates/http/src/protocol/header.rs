//! Ordered, case-insensitive header storage.
//!
//! [`HeaderTable`] keeps at most one entry per header name, compared ignoring ASCII
//! case, and remembers the order in which names were first inserted. Setting a name
//! that is already present replaces that entry where it stands, so repeated request
//! headers collapse to their last occurrence.
//!
//! Names keep the spelling they were set with; this is what goes on the wire.

use std::fmt;

use bytes::{BufMut, BytesMut};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

pub const CONTENT_LENGTH: &str = "Content-Length";
pub const CONTENT_TYPE: &str = "Content-Type";
pub const TRANSFER_ENCODING: &str = "Transfer-Encoding";
pub const CONNECTION: &str = "Connection";
pub const SERVER: &str = "Server";
pub const HOST: &str = "Host";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderTable {
    entries: Vec<(String, String)>,
}

impl HeaderTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { entries: Vec::with_capacity(capacity) }
    }

    #[inline]
    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(n, _)| n.eq_ignore_ascii_case(name))
    }

    /// Sets `name` to `value`, replacing an existing entry in place or appending a new one.
    pub fn set<N, V>(&mut self, name: N, value: V)
    where
        N: AsRef<str> + Into<String>,
        V: Into<String>,
    {
        match self.position(name.as_ref()) {
            Some(index) => self.entries[index] = (name.into(), value.into()),
            None => self.entries.push((name.into(), value.into())),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name).map(|index| self.entries[index].1.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Removes `name` if present, keeping the order of the remaining entries.
    pub fn del(&mut self, name: &str) {
        if let Some(index) = self.position(name) {
            self.entries.remove(index);
        }
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// The `Content-Length` value, or `None` when absent or not a run of ASCII digits.
    pub fn content_length(&self) -> Option<u64> {
        self.get(CONTENT_LENGTH)
            .map(str::trim)
            .filter(|value| !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|value| value.parse::<u64>().ok())
    }

    pub fn set_content_length(&mut self, length: u64) {
        self.set(CONTENT_LENGTH, length.to_string());
    }

    pub fn content_type(&self) -> Option<&str> {
        self.get(CONTENT_TYPE)
    }

    pub fn set_content_type<V: Into<String>>(&mut self, content_type: V) {
        self.set(CONTENT_TYPE, content_type);
    }

    /// Writes one `name: value` pair per entry into `obj`, in table order.
    pub fn dump(&self, obj: &mut Map<String, Value>) {
        for (name, value) in self.iter() {
            obj.insert(name.to_string(), Value::String(value.to_string()));
        }
    }

    /// Appends `Name: Value\r\n` per entry. The terminating blank line is left to the caller.
    pub fn write_to(&self, dst: &mut BytesMut) {
        for (name, value) in self.iter() {
            dst.reserve(name.len() + value.len() + 4);
            dst.put_slice(name.as_bytes());
            dst.put_slice(b": ");
            dst.put_slice(value.as_bytes());
            dst.put_slice(b"\r\n");
        }
    }
}

impl fmt::Display for HeaderTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in self.iter() {
            write!(f, "{name}: {value}\r\n")?;
        }
        Ok(())
    }
}

impl Serialize for HeaderTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.count()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_del() {
        let mut h = HeaderTable::new();
        h.set("Server", "SRS");
        assert_eq!(h.get("Server"), Some("SRS"));
        assert_eq!(h.count(), 1);

        assert_eq!(h.to_string(), "Server: SRS\r\n");

        h.del("Server");
        assert_eq!(h.get("Server"), None);
        assert_eq!(h.count(), 0);
        assert!(h.is_empty());

        // removing an absent name is a no-op
        h.del("Server");
        assert_eq!(h.count(), 0);
    }

    #[test]
    fn content_length_and_type() {
        let mut h = HeaderTable::new();
        assert_eq!(h.content_length(), None);

        h.set_content_length(0);
        assert_eq!(h.content_length(), Some(0));
        assert_eq!(h.count(), 1);

        h.set_content_length(1024);
        assert_eq!(h.content_length(), Some(1024));
        assert_eq!(h.count(), 1);

        h.set_content_type("text/plain");
        assert_eq!(h.content_type(), Some("text/plain"));
        assert_eq!(h.count(), 2);

        let mut obj = Map::new();
        h.dump(&mut obj);
        assert_eq!(obj.len(), 2);
        assert_eq!(obj.get("Content-Length"), Some(&Value::String("1024".into())));
    }

    #[test]
    fn unparsable_content_length() {
        let mut h = HeaderTable::new();
        h.set("Content-Length", "abc");
        assert_eq!(h.content_length(), None);

        h.set("Content-Length", "-1");
        assert_eq!(h.content_length(), None);

        h.set("Content-Length", "+5");
        assert_eq!(h.content_length(), None);

        h.set("Content-Length", "  ");
        assert_eq!(h.content_length(), None);

        h.set("content-length", " 42 ");
        assert_eq!(h.content_length(), Some(42));
        assert_eq!(h.count(), 1);
    }

    #[test]
    fn case_insensitive_collapse_keeps_position() {
        let mut h = HeaderTable::new();
        h.set("Host", "a.example");
        h.set("Accept", "*/*");
        h.set("HOST", "b.example");

        assert_eq!(h.count(), 2);
        assert_eq!(h.get("host"), Some("b.example"));
        assert_eq!(h.to_string(), "HOST: b.example\r\nAccept: */*\r\n");
    }

    #[test]
    fn del_keeps_order() {
        let mut h = HeaderTable::new();
        h.set("A", "1");
        h.set("B", "2");
        h.set("C", "3");
        h.del("b");

        let mut dst = BytesMut::new();
        h.write_to(&mut dst);
        assert_eq!(&dst[..], b"A: 1\r\nC: 3\r\n");
    }

    #[test]
    fn serialize_in_table_order() {
        let mut h = HeaderTable::new();
        h.set("User-Agent", "curl/7.54.0");
        h.set("Host", "ossrs.net");
        h.set("Accept", "*/*");

        let json = serde_json::to_string(&h).unwrap();
        assert_eq!(json, r#"{"User-Agent":"curl/7.54.0","Host":"ossrs.net","Accept":"*/*"}"#);

        let mut obj = Map::new();
        h.dump(&mut obj);
        let keys: Vec<_> = obj.keys().map(String::as_str).collect();
        assert_eq!(keys, ["User-Agent", "Host", "Accept"]);
    }
}
