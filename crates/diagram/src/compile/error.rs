use std::fmt;

use thiserror::Error;

use crate::backend::BackendError;

/// Which identifier namespace an unsupported id came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MethodKind {
    Sampling,
    Computation,
    Parameterization,
    Predicate,
    Line,
}

impl fmt::Display for MethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MethodKind::Sampling => "sampling",
            MethodKind::Computation => "computation",
            MethodKind::Parameterization => "parameterization",
            MethodKind::Predicate => "predicate",
            MethodKind::Line => "line",
        })
    }
}

/// Fatal compilation errors. Any of them aborts the run; nothing is retried.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum CompileError {
    #[error("unsupported {kind} method `{id}`")]
    UnsupportedMethod { kind: MethodKind, id: String },
    #[error("undefined point `{0}`")]
    UndefinedPoint(String),
    #[error("contract violation: {0}")]
    ContractViolation(String),
    #[error("numeric degeneracy: {0}")]
    NumericDegeneracy(String),
}

impl CompileError {
    pub(crate) fn unsupported(kind: MethodKind, id: impl Into<String>) -> Self {
        Self::UnsupportedMethod {
            kind,
            id: id.into(),
        }
    }

    pub(crate) fn contract(reason: impl Into<String>) -> Self {
        Self::ContractViolation(reason.into())
    }
}

impl From<BackendError> for CompileError {
    fn from(e: BackendError) -> Self {
        Self::ContractViolation(e.to_string())
    }
}
