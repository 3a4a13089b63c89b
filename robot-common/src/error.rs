//! Common error types for the build robot client

use thiserror::Error;

use crate::query::ParseError;

/// Common result type for robot operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors shared by every layer of the client
///
/// Inference problems are deliberately absent: they are logged as warnings
/// and never surface as values.
#[derive(Error, Debug)]
pub enum Error {
    /// Search text rejected by the query parser
    #[error("Malformed search query {query:?}")]
    MalformedQuery {
        query: String,
        #[source]
        source: ParseError,
    },

    /// Wrong number of values bound to a query template
    #[error("Query expects {expected} parameter(s), got {actual}")]
    Parameter { expected: usize, actual: usize },

    /// Query compares a field the entity does not have
    #[error("Unknown field {0:?}")]
    UnknownField(String),

    /// More than one entity matched a resolution query
    #[error("Multiple tracks matched {0:?}")]
    Ambiguous(String),

    /// No entity matched a resolution query
    #[error("No tracks matched {0:?}")]
    NotFound(String),

    /// Version control command failed or returned nothing usable
    #[error("Version control error: {0}")]
    VersionControl(String),

    /// RPC failure: transport problem or server-side rejection
    #[error("Remote error: {0}")]
    Remote(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Entity (de)serialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Wrap a parser diagnostic together with the text that produced it
    pub fn malformed(query: impl Into<String>, source: ParseError) -> Self {
        Error::MalformedQuery {
            query: query.into(),
            source,
        }
    }
}
