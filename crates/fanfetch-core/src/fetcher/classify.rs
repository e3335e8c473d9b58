//! Map curl errors onto failure buckets.

use super::FailureKind;

// No `is_*` helper for this one in the curl crate.
const CURLE_WEIRD_SERVER_REPLY: u32 = 8;

/// Classify a curl error into the histogram bucket it is counted under.
pub fn classify_curl_error(e: &curl::Error) -> FailureKind {
    if e.is_operation_timedout() {
        return FailureKind::Timeout;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
    {
        return FailureKind::Connection;
    }
    if e.is_url_malformed()
        || e.is_unsupported_protocol()
        || e.code() as u32 == CURLE_WEIRD_SERVER_REPLY
        || e.is_http2_error()
        || e.is_bad_content_encoding()
    {
        return FailureKind::Malformed;
    }
    FailureKind::Other
}
