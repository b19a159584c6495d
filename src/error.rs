use thiserror::Error;

/// A request that never produced an HTTP response.
///
/// Connection failures, DNS errors, timeouts and broken response bodies all
/// land here. The sweep treats these as fatal and stops; HTTP error statuses
/// are not transport errors and are handled by the caller.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{method} {url} failed")]
    Request {
        method: reqwest::Method,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to read response body from {url}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid request URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}
