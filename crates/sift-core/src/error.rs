use crate::{
    filter::{Combinator, Operation},
    model::path::ResolveError,
    registry::Arity,
    value::{CoerceError, Value},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error as ThisError;

///
/// CompileError
///
/// Structured failure raised while compiling a search request.
/// Every variant indicates malformed caller input; none are retryable.
///

#[derive(Clone, Debug, PartialEq, ThisError)]
pub enum CompileError {
    #[error("invalid sorting field '{field}'")]
    InvalidSortingField { field: String },

    #[error("unsupported operation '{name}'")]
    InvalidOperation { name: String },

    #[error("the value '{value}' is not compatible with type {target}")]
    InvalidFieldValue { value: String, target: &'static str },

    #[error(
        "the operands [{}] are not compatible with operation {operation}; expected {expected}",
        join_values(.operands)
    )]
    InvalidOperandCount {
        operation: Operation,
        operands: Vec<Value>,
        expected: Arity,
    },

    #[error("could not resolve attribute '{segment}' of {owner}")]
    InvalidFieldName { segment: String, owner: String },

    #[error("the number of conditions of a {combinator} group can not be zero")]
    EmptyConditions { combinator: Combinator },

    #[error("invalid conditions count for {combinator}; should be {expected}")]
    InvalidConditionsCount {
        combinator: Combinator,
        expected: &'static str,
    },

    #[error("operation {operation} is not valid for field '{field}' of type {kind}")]
    IncompatibleOperation {
        operation: Operation,
        field: String,
        kind: &'static str,
    },

    #[error("filter tree exceeds the maximum depth of {limit}")]
    MaxDepthExceeded { limit: usize },
}

impl CompileError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidSortingField { .. } => ErrorKind::InvalidSortingField,
            Self::InvalidOperation { .. } => ErrorKind::InvalidOperation,
            Self::InvalidFieldValue { .. } => ErrorKind::InvalidFieldValue,
            Self::InvalidOperandCount { .. } => ErrorKind::InvalidOperandCount,
            Self::InvalidFieldName { .. } => ErrorKind::InvalidFieldName,
            Self::EmptyConditions { .. } => ErrorKind::EmptyConditions,
            Self::InvalidConditionsCount { .. } => ErrorKind::InvalidConditionsCount,
            Self::IncompatibleOperation { .. } => ErrorKind::IncompatibleOperation,
            Self::MaxDepthExceeded { .. } => ErrorKind::MaxDepthExceeded,
        }
    }

    /// Message prefixed with the stable error code, e.g. `SIFT-005: ...`.
    #[must_use]
    pub fn display_with_code(&self) -> String {
        format!("{}: {self}", self.kind().code())
    }

    pub(crate) fn invalid_operand_count(
        operation: Operation,
        operands: &[Value],
        expected: Arity,
    ) -> Self {
        Self::InvalidOperandCount {
            operation,
            operands: operands.to_vec(),
            expected,
        }
    }
}

impl From<ResolveError> for CompileError {
    fn from(err: ResolveError) -> Self {
        Self::InvalidFieldName {
            segment: err.segment,
            owner: err.owner,
        }
    }
}

impl From<CoerceError> for CompileError {
    fn from(err: CoerceError) -> Self {
        Self::InvalidFieldValue {
            value: err.value,
            target: err.target,
        }
    }
}

fn join_values(values: &[Value]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

///
/// ErrorKind
///
/// Machine-checkable discriminant for `CompileError`.
/// Codes are stable across releases.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum ErrorKind {
    InvalidSortingField,
    InvalidOperation,
    InvalidFieldValue,
    InvalidOperandCount,
    InvalidFieldName,
    EmptyConditions,
    InvalidConditionsCount,
    IncompatibleOperation,
    MaxDepthExceeded,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InvalidSortingField => "SIFT-001",
            Self::InvalidOperation => "SIFT-002",
            Self::InvalidFieldValue => "SIFT-003",
            Self::InvalidOperandCount => "SIFT-004",
            Self::InvalidFieldName => "SIFT-005",
            Self::EmptyConditions => "SIFT-006",
            Self::InvalidConditionsCount => "SIFT-007",
            Self::IncompatibleOperation => "SIFT-008",
            Self::MaxDepthExceeded => "SIFT-009",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
