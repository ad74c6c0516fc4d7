//! Error types for parsing and compiling requests.

use thiserror::Error;

/// Caller-facing failure category.
///
/// Oversized requests and malformed requests are reported differently by
/// the protocol layer (payload-too-large vs. bad-request).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Request rejected by the sanity check before parsing
    PayloadTooLarge,
    /// Request rejected while parsing or compiling
    BadRequest,
    /// Request accepted but the execution layer failed
    Internal,
}

/// Errors raised by the sanity check, the parser and the compiler.
///
/// Detection is synchronous and the first error wins: no partial request
/// or filter is ever produced alongside an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// Raw request too large or too deeply nested
    #[error("Request exceeds size limits: {0}")]
    SizeLimitExceeded(String),

    /// Invalid JSON, invalid shape, unknown key or missing field
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// Operator is valid in the language but cannot be compiled for this backend
    #[error("Operator '{0}' is not supported by this backend")]
    UnsupportedOperator(String),

    /// Operator token missing from the catalog
    #[error("Unknown operator: {0}")]
    UnknownOperatorToken(String),

    /// Reserved `#` field name missing from the catalog
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// Step carries both `$depth` and `$exactdepth`
    #[error("Step {step} sets both $depth and $exactdepth")]
    DepthConflict {
        /// Index of the offending step in `$query`
        step: usize,
    },
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;

impl QueryError {
    /// Create a malformed-request error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedRequest(msg.into())
    }

    /// Create a size-limit error
    pub fn too_large(msg: impl Into<String>) -> Self {
        Self::SizeLimitExceeded(msg.into())
    }

    /// Create an unsupported-operator error
    pub fn unsupported(op: impl Into<String>) -> Self {
        Self::UnsupportedOperator(op.into())
    }

    /// Category the protocol layer maps this error to
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::SizeLimitExceeded(_) => ErrorCategory::PayloadTooLarge,
            _ => ErrorCategory::BadRequest,
        }
    }
}

impl From<serde_json::Error> for QueryError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedRequest(format!("invalid JSON: {}", err))
    }
}
