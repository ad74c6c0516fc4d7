//! # Archivum Query
//!
//! Query language core for an archival metadata graph. Units form a DAG
//! through parent links; object groups hang off units.
//!
//! Pipeline: raw JSON -> sanity check -> [`RequestParser`] -> [`QueryRequest`]
//! -> [`MongoCompiler`] -> [`QueryPlan`] -> external [`QueryExecutor`] ->
//! [`ResultEnvelope`].
//!
//! ```
//! use archivum_query::{Collection, FilterCompiler, MongoCompiler, RequestParser};
//!
//! let parser = RequestParser::default();
//! let request = parser
//!     .parse_select(r#"{"$roots": ["id0"], "$query": [{"$exists": "Title"}]}"#)
//!     .unwrap();
//! let plan = MongoCompiler::default()
//!     .compile_request(&request, Collection::Units)
//!     .unwrap();
//!
//! assert_eq!(
//!     plan.first_command().unwrap().to_string(),
//!     r#"{"$and":[{"Title":{"$exists":true}},{"_up":"id0"}]}"#
//! );
//! ```

pub mod builder;
pub mod catalog;
pub mod depth;
pub mod envelope;
pub mod error;
pub mod ir;
pub mod metadata;
pub mod plan;
pub mod render;
pub mod sanity;
pub mod syntax;

pub use catalog::{Hint, Operator, ReservedField};
pub use depth::{DepthScope, WorkingSetExpansion};
pub use envelope::{Hits, ResultEnvelope};
pub use error::{ErrorCategory, QueryError, QueryResult};
pub use ir::{DepthSpec, QueryNode, QueryRequest, QueryStep, RequestKind};
pub use metadata::{ExecutionError, MetadataError, MetadataResult, MetadataService, QueryExecutor};
pub use plan::{Collection, CompiledStep, QueryPlan};
pub use render::{FilterCompiler, MongoCompiler};
pub use sanity::SanityChecker;
pub use syntax::RequestParser;
