use std::path::PathBuf;
use thiserror::Error;

/// The portal could not be reached, logged into, or navigated.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("failed to build http session: {0}")]
    Session(#[source] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with HTTP status {status}")]
    Status { url: String, status: u16 },
    #[error("form `{0}` not found on the page")]
    FormNotFound(String),
    #[error("form `{form}` has no field named `{field}`")]
    MissingField { form: String, field: String },
    #[error("invalid url `{url}`: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// The page did not have the table/row/cell structure the extractor expects.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("container `{0}` not found on {1}")]
    MissingContainer(&'static str, String),
    #[error("row {row} on {url} has no cells")]
    MissingCell { row: usize, url: String },
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("record at {path} is not valid: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize record: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Anything that can abort one fetch/extract pass.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

#[derive(Debug, Error)]
pub enum HostError {
    #[error("chat host request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("chat host answered {status}: {body}")]
    Status { status: u16, body: String },
    #[error("chat host rejected the bot credentials")]
    Unauthorized,
    #[error("unexpected payload from chat host: {0}")]
    Payload(String),
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0}")]
    Invalid(String),
    #[error("missing or invalid bearer token")]
    Forbidden,
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Host(#[from] HostError),
}
