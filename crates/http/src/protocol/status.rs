//! Status code reason phrases and entity-body rules.

use http::StatusCode;

/// Reason phrase used for codes the catalog has no entry for.
pub const STATUS_UNKNOWN: &str = "Status Unknown";

/// Returns the canonical reason phrase for `code`, or [`STATUS_UNKNOWN`].
pub fn reason_phrase(code: u16) -> &'static str {
    StatusCode::from_u16(code).ok().and_then(|status| status.canonical_reason()).unwrap_or(STATUS_UNKNOWN)
}

/// Whether a response with this status may carry an entity body.
///
/// Informational (1xx), 204 No Content and 304 Not Modified responses never do.
pub fn body_allowed(code: u16) -> bool {
    !matches!(code, 100..=199 | 204 | 304)
}
