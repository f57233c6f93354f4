use crate::content_type::UnknownTag;
use thiserror::Error;

/// Categories of resolution failure surfaced in the `exception` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnknownTag,
    ParseFailure,
    ReadFailure,
    Unexpected,
}

/// A failed resolution. "Unsupported" is not an error and has no variant here.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    UnknownTag(#[from] UnknownTag),
    #[error("{message}")]
    ParseFailure { message: String },
    #[error("{0}")]
    ReadFailure(#[from] std::io::Error),
    #[error("{message}")]
    Unexpected { message: String },
}

impl ResolveError {
    pub fn parse_failure(message: impl Into<String>) -> Self {
        Self::ParseFailure {
            message: message.into(),
        }
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ResolveError::UnknownTag(_) => ErrorKind::UnknownTag,
            ResolveError::ParseFailure { .. } => ErrorKind::ParseFailure,
            ResolveError::ReadFailure(_) => ErrorKind::ReadFailure,
            ResolveError::Unexpected { .. } => ErrorKind::Unexpected,
        }
    }
}

pub type ResolveResult<T> = Result<T, ResolveError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn io_errors_are_read_failures() {
        let err: ResolveError = io::Error::new(io::ErrorKind::NotFound, "raw/classes.toml").into();
        assert_eq!(err.kind(), ErrorKind::ReadFailure);
        assert_eq!(err.to_string(), "raw/classes.toml");
    }

    #[test]
    fn parse_failure_carries_decoder_message() {
        let err = ResolveError::parse_failure("TOML parse error at line 3");
        assert_eq!(err.kind(), ErrorKind::ParseFailure);
        assert_eq!(err.to_string(), "TOML parse error at line 3");
    }
}
