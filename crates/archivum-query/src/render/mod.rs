//! Backend compilers.
//!
//! A compiler turns parsed requests into backend filter documents. The
//! document-store compiler is the only backend; full-text operators are
//! rejected by it.

mod fields;
mod mongo;

pub use fields::FieldMapper;
pub use mongo::{exact_depth_filter, full_command, root_filter, MongoCompiler};

use serde_json::Value;

use crate::error::QueryResult;
use crate::ir::{OrderBy, Projection, QueryNode, QueryRequest};
use crate::plan::{Collection, QueryPlan};

/// Trait for compiling requests to a backend filter language.
pub trait FilterCompiler: Send + Sync {
    /// Unique name for this compiler
    fn name(&self) -> &str;

    /// Compile one expression tree, without any scope constraint
    fn compile_node(&self, node: &QueryNode) -> QueryResult<Value>;

    /// Compile `$projection.$fields`
    fn compile_projection(&self, projection: &Projection) -> Value;

    /// Compile `$filter.$orderby`
    fn compile_sort(&self, order_by: &[OrderBy]) -> Value;

    /// Compile a whole request against `collection`
    fn compile_request(
        &self,
        request: &QueryRequest,
        collection: Collection,
    ) -> QueryResult<QueryPlan>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryError;
    use serde_json::json;

    struct MockCompiler;

    impl FilterCompiler for MockCompiler {
        fn name(&self) -> &str {
            "mock"
        }

        fn compile_node(&self, node: &QueryNode) -> QueryResult<Value> {
            Ok(json!({"op": node.operator().token()}))
        }

        fn compile_projection(&self, _projection: &Projection) -> Value {
            json!({})
        }

        fn compile_sort(&self, _order_by: &[OrderBy]) -> Value {
            json!({})
        }

        fn compile_request(
            &self,
            _request: &QueryRequest,
            _collection: Collection,
        ) -> QueryResult<QueryPlan> {
            Err(QueryError::unsupported("mock"))
        }
    }

    #[test]
    fn test_mock_compiler() {
        let compiler: Box<dyn FilterCompiler> = Box::new(MockCompiler);
        let node = crate::builder::exists("Title").unwrap();

        assert_eq!(compiler.name(), "mock");
        assert_eq!(compiler.compile_node(&node).unwrap(), json!({"op": "$exists"}));
    }
}
