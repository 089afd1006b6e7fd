//! Error types.
//!
//! Internally we use `anyhow` through `Res<T>`. Anything that crosses the public API returns
//! `Result<T>`, whose `Error` also carries an `ErrorType` so that a caller can tell a network
//! failure from a rejected token or a bad input without parsing messages.

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};

/// The internal result type.
pub(crate) type Res<T> = anyhow::Result<T>;

/// The public result type.
pub type Result<T> = std::result::Result<T, Error>;

/// The broad category of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// The configuration or home directory is missing or invalid.
    Config,
    /// Reading or writing a local file failed.
    Filesystem,
    /// The backend could not be reached or answered with a failure status.
    Network,
    /// Tokens are missing, expired or were rejected, or the refresh failed.
    Auth,
    /// Local input, or a record returned by the backend, is malformed.
    Validation,
    /// A document generator failed.
    Export,
    /// The action was refused, e.g. it is already in progress.
    Request,
}

serde_plain::derive_display_from_serialize!(ErrorType);

/// The public error type. It wraps the `anyhow` chain that produced it.
pub struct Error {
    error_type: ErrorType,
    inner: anyhow::Error,
}

impl Error {
    pub fn new(error_type: ErrorType, inner: impl Into<anyhow::Error>) -> Self {
        Self {
            error_type,
            inner: inner.into(),
        }
    }

    /// Shorthand for an error built from a message.
    pub(crate) fn msg(error_type: ErrorType, message: impl Display) -> Self {
        Self::new(error_type, anyhow::anyhow!("{message}"))
    }

    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#}", self.inner)
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} error: {:?}", self.error_type, self.inner)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

/// Converts an internal result into the public `Result` by tagging it with an `ErrorType`.
pub(crate) trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T, E> IntoResult<T> for std::result::Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| Error::new(error_type, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_display_includes_context_chain() {
        let res: Res<()> = Err(anyhow::anyhow!("connection refused")).context("GET /sales failed");
        let err = res.pub_result(ErrorType::Network).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Network);
        assert_eq!(err.to_string(), "GET /sales failed: connection refused");
    }

    #[test]
    fn test_error_type_display() {
        assert_eq!(ErrorType::Validation.to_string(), "validation");
        assert_eq!(ErrorType::Auth.to_string(), "auth");
    }
}
