//! Internal helpers mapping HTTP/reqwest failures to [`KkmError`].

use std::time::Duration;

use protocol::KkmError;

/// Maps a non-2xx HTTP status to [`KkmError::Transport`].
pub(crate) fn map_http_status(status: reqwest::StatusCode, body: &str) -> KkmError {
    let reason = status.canonical_reason().unwrap_or("unknown status");
    let message = if body.trim().is_empty() {
        reason.to_string()
    } else {
        format!("{reason}: {}", body.trim())
    };
    KkmError::Transport {
        status: Some(status.as_u16()),
        message,
    }
}

/// Maps a [`reqwest::Error`] raised while sending or reading a request.
///
/// `budget` is the deadline the request was given; it is reported back in
/// [`KkmError::Timeout`].
pub(crate) fn map_reqwest_error(err: reqwest::Error, budget: Duration) -> KkmError {
    if err.is_timeout() {
        KkmError::Timeout { budget }
    } else if err.is_builder() {
        KkmError::Configuration {
            message: format!("invalid request to device server: {err}"),
        }
    } else {
        KkmError::network(err)
    }
}
