//! Error taxonomy for the fetch → summarize → classify pipeline.
//!
//! Every error here is designed to be displayable in a log line. None of them
//! escape a source adapter: the fetch pipeline logs them and degrades to "no data".

use thiserror::Error;

/// HTTP-level failures, one variant per status code the vendors are known to send.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("unauthorized (401): API key is invalid or missing")]
    Unauthorized,

    #[error("forbidden (403): access denied, check the API key")]
    Forbidden,

    #[error("not found (404): check the request and try again")]
    NotFound,

    #[error("rate limited (429): too many requests, wait before retrying")]
    RateLimited,

    #[error("internal server error (500): the provider encountered an issue")]
    ServerError,

    #[error("service unavailable (503): the provider is temporarily down")]
    ServiceUnavailable,

    #[error("unexpected HTTP status {0}")]
    UnexpectedStatus(u16),

    #[error("host unreachable: {0}")]
    Unreachable(String),
}

impl NetworkError {
    /// Map a non-200 status code to its named failure.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            429 => Self::RateLimited,
            500 => Self::ServerError,
            503 => Self::ServiceUnavailable,
            other => Self::UnexpectedStatus(other),
        }
    }
}

/// The response body did not have the shape the source expects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("response body is empty")]
    EmptyBody,

    #[error("response is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("expected key '{0}' not found in response")]
    MissingKey(String),

    #[error("'{key}' has an unexpected type (expected {expected})")]
    UnexpectedShape { key: String, expected: &'static str },

    #[error("none of the expected value fields {expected:?} were found")]
    NoValueFields { expected: Vec<String> },

    #[error("provider returned an error: {0}")]
    VendorMessage(String),
}

/// Input to the summarizer was empty or not numeric.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("cannot summarize an empty series")]
    EmptySeries,

    #[error("field '{field}' is absent from every record")]
    FieldAbsent { field: String },

    #[error("field '{field}' in record {index} is not numeric: {value}")]
    NotNumeric {
        field: String,
        index: usize,
        value: String,
    },

    #[error("field '{field}' in record {index} is not finite")]
    NotFinite { field: String, index: usize },

    #[error("statistics for field '{field}' exceed the f64 range")]
    Unrepresentable { field: String },
}

/// The classifier needs a statistic the summary does not carry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("summary is missing required field '{field}'")]
pub struct MissingFieldError {
    pub field: String,
}

/// Anything that can go wrong inside a source adapter.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SourceError {
    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("classification error: {0}")]
    MissingField(#[from] MissingFieldError),
}
