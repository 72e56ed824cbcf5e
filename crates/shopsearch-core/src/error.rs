use thiserror::Error;

use crate::types::SourceKind;

#[derive(Debug, Error)]
pub enum Error {
    /// Empty or whitespace-only query text.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// A requested retrieval path could not be built. Not fatal for a search;
    /// the service reports it as a note and continues with the other path.
    #[error("{path} retrieval unavailable: {reason}")]
    IndexUnavailable { path: SourceKind, reason: String },

    /// Out-of-range request parameter, only surfaced under strict validation.
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Operation failed: {0}")]
    Operation(String),
}

impl Error {
    /// Stable machine-readable kind, used by the HTTP boundary.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidQuery(_) => "invalid_query",
            Error::IndexUnavailable { .. } => "index_unavailable",
            Error::InvalidParameter { .. } => "invalid_parameter",
            Error::InvalidConfig(_) => "invalid_config",
            Error::NotFound(_) => "not_found",
            Error::Operation(_) => "operation_failed",
        }
    }

    /// Whether the caller sent something structurally invalid.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::InvalidQuery(_) | Error::InvalidParameter { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
