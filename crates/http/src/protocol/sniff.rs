//! Content-Type sniffing from the leading bytes of a response body.
//!
//! The matcher inspects at most [`SNIFF_LEN`] bytes and walks a fixed signature
//! table; the first match wins. Bodies that match nothing are reported as UTF-8
//! text when they contain no binary control bytes, and as
//! `application/octet-stream` otherwise.

/// Maximum number of leading bytes consulted.
pub const SNIFF_LEN: usize = 512;

pub const OCTET_STREAM: &str = "application/octet-stream";

const TEXT_PLAIN_UTF_8: &str = "text/plain; charset=utf-8";
const TEXT_HTML_UTF_8: &str = "text/html; charset=utf-8";

/// MPEG transport stream packet size
const TS_PACKET: usize = 188;

enum Signature {
    /// Case-insensitive tag, after optional leading whitespace, followed by a space or `>`.
    Html(&'static [u8]),
    /// Literal prefix.
    Exact(&'static [u8]),
    /// `data[i] & mask[i] == pattern[i]` over the pattern length.
    Masked { mask: &'static [u8], pattern: &'static [u8], skip_ws: bool },
    /// ISO base media file with an `mp4*` brand.
    Mp4,
    /// Two sync bytes one transport packet apart.
    MpegTs,
}

static SIGNATURES: &[(Signature, &str)] = &[
    (Signature::Html(b"<!DOCTYPE HTML"), TEXT_HTML_UTF_8),
    (Signature::Html(b"<HTML"), TEXT_HTML_UTF_8),
    (Signature::Html(b"<HEAD"), TEXT_HTML_UTF_8),
    (Signature::Html(b"<SCRIPT"), TEXT_HTML_UTF_8),
    (Signature::Html(b"<IFRAME"), TEXT_HTML_UTF_8),
    (Signature::Html(b"<H1"), TEXT_HTML_UTF_8),
    (Signature::Html(b"<DIV"), TEXT_HTML_UTF_8),
    (Signature::Html(b"<FONT"), TEXT_HTML_UTF_8),
    (Signature::Html(b"<TABLE"), TEXT_HTML_UTF_8),
    (Signature::Html(b"<A"), TEXT_HTML_UTF_8),
    (Signature::Html(b"<STYLE"), TEXT_HTML_UTF_8),
    (Signature::Html(b"<TITLE"), TEXT_HTML_UTF_8),
    (Signature::Html(b"<B"), TEXT_HTML_UTF_8),
    (Signature::Html(b"<BODY"), TEXT_HTML_UTF_8),
    (Signature::Html(b"<BR"), TEXT_HTML_UTF_8),
    (Signature::Html(b"<P"), TEXT_HTML_UTF_8),
    (Signature::Html(b"<!--"), TEXT_HTML_UTF_8),
    (Signature::Masked { mask: b"\xFF\xFF\xFF\xFF\xFF", pattern: b"<?xml", skip_ws: true }, "text/xml; charset=utf-8"),
    (Signature::Exact(b"%PDF-"), "application/pdf"),
    (Signature::Exact(b"%!PS-Adobe-"), "application/postscript"),
    // byte order marks
    (Signature::Exact(b"\xFE\xFF"), "text/plain; charset=utf-16be"),
    (Signature::Exact(b"\xFF\xFE"), "text/plain; charset=utf-16le"),
    (Signature::Exact(b"\xEF\xBB\xBF"), TEXT_PLAIN_UTF_8),
    // images
    (Signature::Exact(b"\x00\x00\x01\x00"), "image/x-icon"),
    (Signature::Exact(b"\x00\x00\x02\x00"), "image/x-icon"),
    (Signature::Exact(b"BM"), "image/bmp"),
    (Signature::Exact(b"GIF87a"), "image/gif"),
    (Signature::Exact(b"GIF89a"), "image/gif"),
    (
        Signature::Masked { mask: b"\xFF\xFF\xFF\xFF\x00\x00\x00\x00\xFF\xFF\xFF\xFF\xFF\xFF", pattern: b"RIFF\x00\x00\x00\x00WEBPVP", skip_ws: false },
        "image/webp",
    ),
    (Signature::Exact(b"\x89PNG\x0D\x0A\x1A\x0A"), "image/png"),
    (Signature::Exact(b"\xFF\xD8\xFF"), "image/jpeg"),
    // audio and video
    (
        Signature::Masked { mask: b"\xFF\xFF\xFF\xFF\x00\x00\x00\x00\xFF\xFF\xFF\xFF", pattern: b"FORM\x00\x00\x00\x00AIFF", skip_ws: false },
        "audio/aiff",
    ),
    (Signature::Exact(b"ID3"), "audio/mpeg"),
    (Signature::Exact(b"OggS\x00"), "application/ogg"),
    (Signature::Exact(b"MThd\x00\x00\x00\x06"), "audio/midi"),
    (
        Signature::Masked { mask: b"\xFF\xFF\xFF\xFF\x00\x00\x00\x00\xFF\xFF\xFF\xFF", pattern: b"RIFF\x00\x00\x00\x00AVI ", skip_ws: false },
        "video/avi",
    ),
    (
        Signature::Masked { mask: b"\xFF\xFF\xFF\xFF\x00\x00\x00\x00\xFF\xFF\xFF\xFF", pattern: b"RIFF\x00\x00\x00\x00WAVE", skip_ws: false },
        "audio/wave",
    ),
    (Signature::Mp4, "video/mp4"),
    (Signature::Exact(b"\x1A\x45\xDF\xA3"), "video/webm"),
    (Signature::Exact(b"FLV\x01"), "video/x-flv"),
    (Signature::MpegTs, "video/MP2T"),
    // archives
    (Signature::Exact(b"\x1F\x8B\x08"), "application/x-gzip"),
    (Signature::Exact(b"PK\x03\x04"), "application/zip"),
    (Signature::Exact(b"Rar!\x1A\x07\x00"), "application/x-rar-compressed"),
    (Signature::Exact(b"Rar!\x1A\x07\x01\x00"), "application/x-rar-compressed"),
    (Signature::Exact(b"\x00\x61\x73\x6D"), "application/wasm"),
];

/// Guesses the media type of `data`.
///
/// Returns [`OCTET_STREAM`] for an empty slice.
pub fn detect_content_type(data: &[u8]) -> &'static str {
    if data.is_empty() {
        return OCTET_STREAM;
    }

    let data = &data[..data.len().min(SNIFF_LEN)];
    let first_non_ws = data.iter().position(|b| !is_ws(*b)).unwrap_or(data.len());

    SIGNATURES
        .iter()
        .find(|(signature, _)| signature.matches(data, first_non_ws))
        .map_or_else(|| if is_text(data) { TEXT_PLAIN_UTF_8 } else { OCTET_STREAM }, |(_, content_type)| *content_type)
}

impl Signature {
    fn matches(&self, data: &[u8], first_non_ws: usize) -> bool {
        match self {
            Signature::Html(tag) => {
                let data = &data[first_non_ws..];
                if data.len() < tag.len() + 1 {
                    return false;
                }
                let same = tag.iter().zip(data).all(|(t, d)| if t.is_ascii_uppercase() { d & 0xDF == *t } else { d == t });
                same && matches!(data[tag.len()], b' ' | b'>')
            }
            Signature::Exact(prefix) => data.starts_with(prefix),
            Signature::Masked { mask, pattern, skip_ws } => {
                let data = if *skip_ws { &data[first_non_ws..] } else { data };
                data.len() >= pattern.len() && pattern.iter().zip(mask.iter()).zip(data).all(|((p, m), d)| d & m == *p)
            }
            Signature::Mp4 => is_mp4(data),
            Signature::MpegTs => data.len() > TS_PACKET && data[0] == 0x47 && data[TS_PACKET] == 0x47,
        }
    }
}

fn is_mp4(data: &[u8]) -> bool {
    if data.len() < 12 {
        return false;
    }

    let box_size = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if data.len() < box_size || box_size % 4 != 0 || &data[4..8] != b"ftyp" {
        return false;
    }

    // major brand at 8, minor version at 12, compatible brands after
    (8..box_size).step_by(4).filter(|st| *st != 12).any(|st| data[st..].starts_with(b"mp4"))
}

#[inline]
fn is_ws(b: u8) -> bool {
    matches!(b, b'\t' | b'\n' | b'\x0C' | b'\r' | b' ')
}

fn is_text(data: &[u8]) -> bool {
    !data.iter().any(|b| matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_octet_stream() {
        assert_eq!(detect_content_type(&[]), "application/octet-stream");
        assert_eq!(detect_content_type(b""), OCTET_STREAM);
    }

    #[test]
    fn html_and_xml() {
        assert_eq!(detect_content_type(b"<html><body>hi</body></html>"), TEXT_HTML_UTF_8);
        assert_eq!(detect_content_type(b"\r\n  <!DOCTYPE html>\n<html>"), TEXT_HTML_UTF_8);
        assert_eq!(detect_content_type(b"<p>x</p>"), TEXT_HTML_UTF_8);
        assert_eq!(detect_content_type(b"  <?xml version=\"1.0\"?>"), "text/xml; charset=utf-8");
        // a bare tag prefix is not html
        assert_eq!(detect_content_type(b"<paragraph"), TEXT_PLAIN_UTF_8);
    }

    #[test]
    fn media_signatures() {
        assert_eq!(detect_content_type(b"FLV\x01\x05\x00\x00\x00\x09"), "video/x-flv");
        assert_eq!(detect_content_type(b"ID3\x04\x00"), "audio/mpeg");
        assert_eq!(detect_content_type(b"\x1A\x45\xDF\xA3\x01"), "video/webm");
        assert_eq!(detect_content_type(b"RIFF\x10\x00\x00\x00WAVEfmt "), "audio/wave");
        assert_eq!(detect_content_type(b"\x89PNG\r\n\x1a\n\x00\x00"), "image/png");
        assert_eq!(detect_content_type(b"GIF89a\x01\x00"), "image/gif");

        let mut ts = vec![0u8; TS_PACKET * 2];
        ts[0] = 0x47;
        ts[TS_PACKET] = 0x47;
        assert_eq!(detect_content_type(&ts), "video/MP2T");
    }

    #[test]
    fn mp4_brand() {
        let mut data = Vec::new();
        data.extend_from_slice(&20u32.to_be_bytes());
        data.extend_from_slice(b"ftypisom\x00\x00\x02\x00mp41");
        assert_eq!(detect_content_type(&data), "video/mp4");

        // box claims more bytes than we have
        let mut short = Vec::new();
        short.extend_from_slice(&64u32.to_be_bytes());
        short.extend_from_slice(b"ftypmp42\x00\x00\x00\x00");
        assert_ne!(detect_content_type(&short), "video/mp4");
    }

    #[test]
    fn text_or_binary_fallback() {
        assert_eq!(detect_content_type(b"Found"), TEXT_PLAIN_UTF_8);
        assert_eq!(detect_content_type(b"{\"code\":0}"), TEXT_PLAIN_UTF_8);
        assert_eq!(detect_content_type(b"\x01\x02\x03\x04"), OCTET_STREAM);
    }
}
