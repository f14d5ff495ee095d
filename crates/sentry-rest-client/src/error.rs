use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Unexpected HTTP status {status}")]
    Status { status: StatusCode, body: String },
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Invalid URI template: {0}")]
    Template(String),
}

impl ClientError {
    /// Status code carried by the error, if the server answered at all
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::Transport(e) => e.status(),
            _ => None,
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TraceHeaderError {
    #[error("expected 2 or 3 segments, got {0}")]
    SegmentCount(usize),
    #[error("invalid trace id: {0}")]
    TraceId(String),
    #[error("invalid span id: {0}")]
    SpanId(String),
    #[error("invalid sampled flag: {0}")]
    Sampled(String),
}
