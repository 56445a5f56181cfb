use std::path::PathBuf;
use thiserror::Error;

/// A location source that cannot be turned into a route list. Fatal at startup.
#[derive(Debug, Error)]
pub enum SourceFormatError {
    #[error("failed to read location source {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("location source {} has no locations", .path.display())]
    Empty { path: PathBuf },

    #[error("location source {}: label {label:?} on line {line} has no coordinate line", .path.display())]
    MissingCoordinate {
        path: PathBuf,
        line: usize,
        label: String,
    },

    #[error("location source {}: line {line} is not a valid \"lat,lon\" coordinate ({value:?}): {reason}", .path.display())]
    InvalidCoordinate {
        path: PathBuf,
        line: usize,
        value: String,
        reason: String,
    },

    #[error("location source {}: label {label:?} on line {line} was already used on line {first_line}", .path.display())]
    DuplicateLabel {
        path: PathBuf,
        label: String,
        line: usize,
        first_line: usize,
    },
}

/// A whole query failed. The query is skipped and retried on the next tick.
///
/// Response bodies are carried for logging but kept out of `Display`.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("HTTP {status}")]
    Status { status: u16, body: String },

    #[error("API returned status {status}{}", message_suffix(.message))]
    Api {
        status: String,
        message: Option<String>,
        body: String,
    },

    #[error("malformed response: {reason}")]
    Malformed { reason: String, body: String },
}

// The request URL carries the API key in its query string.
impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::Transport(e.without_url())
    }
}

fn message_suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {m}"))
        .unwrap_or_default()
}

impl FetchError {
    /// Raw response text, when the server answered at all.
    pub fn body(&self) -> Option<&str> {
        match self {
            FetchError::Transport(_) => None,
            FetchError::Status { body, .. }
            | FetchError::Api { body, .. }
            | FetchError::Malformed { body, .. } => Some(body),
        }
    }
}

/// One destination in an otherwise successful response is unusable.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PartialResultError {
    #[error("response has no row for origin {origin}")]
    MissingRow { origin: usize },

    #[error("response has no element for destination {index}")]
    MissingElement { index: usize },

    #[error("element {index} has status {status}")]
    ElementStatus { index: usize, status: String },

    #[error("element {index} is missing {field}")]
    MissingField { index: usize, field: &'static str },
}

/// A measurement could not be appended to its log.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Settings or credentials that prevent the collector from starting.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("no API key found: {0}")]
    MissingCredential(String),

    #[error("API key from {origin} is malformed: {reason}")]
    MalformedCredential { origin: String, reason: String },
}
