use crate::{RecordId, Token};
use std::fmt;
use thiserror::Error;

/// Which side a rejected record was submitted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordLocation {
    Indexed(RecordId),
    Query,
}

impl fmt::Display for RecordLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordLocation::Indexed(id) => write!(f, "record {id}"),
            RecordLocation::Query => f.write_str("query"),
        }
    }
}

/// Errors raised by index construction and querying.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("similarity threshold must be in (0, 1], got {0}")]
    InvalidThreshold(f64),

    #[error("unsupported similarity function {0:?}")]
    UnsupportedSimilarity(String),

    #[error("cannot build an index from an empty collection")]
    EmptyCollection,

    #[error("duplicate token {token} in {location}")]
    DuplicateToken { location: RecordLocation, token: Token },
}

/// Coarse classification of [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad threshold or similarity name. Only raised at build time.
    Configuration,
    /// Bad records: empty collection or a repeated token.
    Input,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidThreshold(_) | Error::UnsupportedSimilarity(_) => ErrorKind::Configuration,
            Error::EmptyCollection | Error::DuplicateToken { .. } => ErrorKind::Input,
        }
    }
}
