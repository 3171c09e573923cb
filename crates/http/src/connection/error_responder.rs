use crate::connection::ResponseWriter;
use crate::protocol::{body_allowed, reason_phrase, SendError};

/// Writes a minimal plain-text response for `status` and completes it.
///
/// The body is the reason phrase of the status, `Found` for 302. Statuses that may
/// not carry a body get the status line and headers only.
pub fn write_error<W: ResponseWriter + ?Sized>(writer: &mut W, status: u16) -> Result<(), SendError> {
    if !body_allowed(status) {
        writer.write_header(status);
        return writer.final_request();
    }

    let body = reason_phrase(status);

    let headers = writer.header();
    headers.set_content_type(mime::TEXT_PLAIN_UTF_8.as_ref());
    headers.set_content_length(body.len() as u64);

    writer.write_header(status);
    writer.write(body.as_bytes())?;
    writer.final_request()
}
