use serde::{Deserialize, Serialize};
use sift_core::{
    config::ConfigError,
    error::{CompileError, ErrorKind as CompileErrorKind},
};
use thiserror::Error as ThisError;

///
/// Error
/// Public error type with a stable kind taxonomy.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize, ThisError)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Stable code for compile failures, e.g. `SIFT-005`.
    #[must_use]
    pub const fn code(&self) -> Option<&'static str> {
        match self.kind {
            ErrorKind::Compile(kind) => Some(kind.code()),
            ErrorKind::Config => None,
        }
    }
}

impl From<CompileError> for Error {
    fn from(err: CompileError) -> Self {
        Self::new(ErrorKind::Compile(err.kind()), err.to_string())
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::new(ErrorKind::Config, err.to_string())
    }
}

///
/// ErrorKind
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ErrorKind {
    /// The search request is malformed; the caller must fix it.
    Compile(CompileErrorKind),

    /// Compiler configuration could not be loaded.
    Config,
}
