use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// Errors raised by the outbound service clients.
///
/// Every variant carries the name of the service it came from so a caller
/// chaining several lookups can tell which leg failed.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request never produced a response (DNS, connect, TLS, body read).
    #[error("Failed to reach {service}: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success HTTP status.
    #[error("{service} request failed with status {status}: {body}")]
    Status {
        service: &'static str,
        status: StatusCode,
        body: String,
    },

    /// The response body was not the JSON we expected.
    #[error("Failed to parse {service} JSON: {source}")]
    Parse {
        service: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The JSON decoded but a field we read was absent.
    #[error("{service} response is missing `{field}`")]
    MissingField {
        service: &'static str,
        field: &'static str,
    },

    /// The service reported an application-level status other than `OK`.
    #[error("{service} rejected the request: {status}")]
    Rejected {
        service: &'static str,
        status: String,
    },

    /// The geocoder found no feature for the address.
    #[error("No match found for address '{address}'")]
    NoMatch { address: String },

    /// Reading or writing a local snapshot file failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ServiceError {
    /// True for the "address not found" outcome of a geocoding lookup.
    pub fn is_no_match(&self) -> bool {
        matches!(self, ServiceError::NoMatch { .. })
    }

    pub(crate) fn parse(service: &'static str, source: serde_json::Error) -> Self {
        ServiceError::Parse { service, source }
    }

    pub(crate) fn missing(service: &'static str, field: &'static str) -> Self {
        ServiceError::MissingField { service, field }
    }
}
