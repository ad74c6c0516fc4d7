//! Request parsing.
//!
//! `RequestParser` is the single entry point for select, insert and update
//! requests. Every entry point runs the sanity check with the same limits
//! before decoding, then builds an immutable `QueryRequest`.

mod node;
mod request;

pub use node::{parse_expression, parse_step};

use archivum_config::QueryLimits;
use serde_json::Value;
use tracing::debug;

use crate::error::{QueryError, QueryResult};
use crate::ir::{QueryRequest, RequestKind};
use crate::sanity::SanityChecker;

/// Parser for raw requests.
///
/// Holds only immutable limits and can be shared between threads.
#[derive(Debug, Clone, Default)]
pub struct RequestParser {
    sanity: SanityChecker,
}

impl RequestParser {
    pub fn new(limits: QueryLimits) -> Self {
        Self {
            sanity: SanityChecker::new(limits),
        }
    }

    pub fn limits(&self) -> &QueryLimits {
        self.sanity.limits()
    }

    pub fn parse_select(&self, text: &str) -> QueryResult<QueryRequest> {
        self.parse_str(RequestKind::Select, text)
    }

    pub fn parse_insert(&self, text: &str) -> QueryResult<QueryRequest> {
        self.parse_str(RequestKind::Insert, text)
    }

    pub fn parse_update(&self, text: &str) -> QueryResult<QueryRequest> {
        self.parse_str(RequestKind::Update, text)
    }

    /// Parse raw request text
    pub fn parse_str(&self, kind: RequestKind, text: &str) -> QueryResult<QueryRequest> {
        let value = self.decode(text)?;
        self.parse_checked(kind, &value)
    }

    /// Sanity-check and decode raw request text without interpreting it
    pub fn decode(&self, text: &str) -> QueryResult<Value> {
        if text.trim().is_empty() {
            return Err(QueryError::malformed("request is empty"));
        }
        self.sanity.check_str(text)?;
        Ok(serde_json::from_str(text)?)
    }

    /// Parse an already-decoded request
    pub fn parse_value(&self, kind: RequestKind, value: &Value) -> QueryResult<QueryRequest> {
        self.sanity.check_value(value)?;
        self.parse_checked(kind, value)
    }

    /// Parse a value that already went through the sanity check
    pub(crate) fn parse_checked(
        &self,
        kind: RequestKind,
        value: &Value,
    ) -> QueryResult<QueryRequest> {
        let request = request::parse_request(kind, value, self.limits())?;
        debug!(
            %kind,
            roots = request.roots().len(),
            steps = request.steps().len(),
            "Parsed request"
        );
        Ok(request)
    }
}
