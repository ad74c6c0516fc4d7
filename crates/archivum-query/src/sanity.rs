//! Pre-parse sanity check.
//!
//! Rejects requests that are too large or too deeply nested before any
//! structural parsing happens. Failures are `SizeLimitExceeded`, never
//! `MalformedRequest`, so callers can report them separately.

use archivum_config::QueryLimits;
use serde_json::Value;
use tracing::warn;

use crate::error::{QueryError, QueryResult};

/// Size and nesting gate shared by every parse entry point
#[derive(Debug, Clone, Copy, Default)]
pub struct SanityChecker {
    limits: QueryLimits,
}

impl SanityChecker {
    pub fn new(limits: QueryLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &QueryLimits {
        &self.limits
    }

    /// Check raw request text, returning it unchanged on success
    pub fn check_str<'a>(&self, request: &'a str) -> QueryResult<&'a str> {
        if request.len() > self.limits.max_request_size {
            warn!(
                size = request.len(),
                max = self.limits.max_request_size,
                "Request rejected: too large"
            );
            return Err(QueryError::too_large(format!(
                "request is {} bytes (max {})",
                request.len(),
                self.limits.max_request_size
            )));
        }

        let depth = nesting_depth(request);
        if depth > self.limits.max_nesting_depth {
            warn!(
                depth,
                max = self.limits.max_nesting_depth,
                "Request rejected: nested too deeply"
            );
            return Err(QueryError::too_large(format!(
                "request nesting depth is {} (max {})",
                depth, self.limits.max_nesting_depth
            )));
        }

        Ok(request)
    }

    /// Check an already-decoded request by its serialized form
    pub fn check_value<'a>(&self, request: &'a Value) -> QueryResult<&'a Value> {
        let text = serde_json::to_string(request)?;
        self.check_str(&text)?;
        Ok(request)
    }
}

/// Maximum nesting of objects and arrays, ignoring brackets inside strings.
///
/// Scans the text without building any structure; unbalanced input is
/// measured as far as it goes and left for the parser to reject.
pub fn nesting_depth(text: &str) -> usize {
    let mut depth = 0usize;
    let mut max = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for byte in text.bytes() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' | b'[' => {
                depth += 1;
                max = max.max(depth);
            }
            b'}' | b']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }

    max
}
