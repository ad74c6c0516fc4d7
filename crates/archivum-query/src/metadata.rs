//! Metadata request facade.
//!
//! `MetadataService` is what the protocol layer calls. Each entry point
//! rejects empty and oversized requests, parses, optionally pins the roots to
//! an id from the request path, compiles a `QueryPlan` and hands it to a
//! `QueryExecutor`.

use archivum_config::ArchivumConfig;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::envelope::ResultEnvelope;
use crate::error::{ErrorCategory, QueryError};
use crate::ir::{QueryRequest, RequestKind};
use crate::plan::{Collection, QueryPlan};
use crate::render::{FilterCompiler, MongoCompiler};
use crate::syntax::RequestParser;

/// Failures reported by an executor
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    /// A referenced entity (usually a parent) does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Insert of an id that is already stored
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

/// Errors returned by the metadata facade
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("Execution failed: {0}")]
    Execution(#[from] ExecutionError),
}

impl MetadataError {
    /// Category the protocol layer maps this error to
    pub fn category(&self) -> ErrorCategory {
        match self {
            MetadataError::Query(err) => err.category(),
            MetadataError::Execution(_) => ErrorCategory::Internal,
        }
    }
}

/// Result type for metadata operations
pub type MetadataResult<T> = Result<T, MetadataError>;

/// Runs compiled plans against a store.
///
/// The executor walks the plan's steps: the first step is bound to the
/// plan roots, each later step to the ids returned by the previous one,
/// after the expansion the step asks for.
pub trait QueryExecutor: Send + Sync {
    fn execute(&self, plan: &QueryPlan) -> Result<ResultEnvelope, ExecutionError>;
}

impl<E: QueryExecutor + ?Sized> QueryExecutor for Box<E> {
    fn execute(&self, plan: &QueryPlan) -> Result<ResultEnvelope, ExecutionError> {
        (**self).execute(plan)
    }
}

/// Target of one facade call
struct Target<'a> {
    kind: RequestKind,
    collection: Collection,
    id: Option<&'a str>,
}

/// Entry points for unit and object-group metadata
pub struct MetadataService<E> {
    parser: RequestParser,
    compiler: MongoCompiler,
    executor: E,
}

impl<E: QueryExecutor> MetadataService<E> {
    /// Service with default limits and ancestry fields
    pub fn new(executor: E) -> Self {
        Self {
            parser: RequestParser::default(),
            compiler: MongoCompiler::default(),
            executor,
        }
    }

    pub fn with_config(config: &ArchivumConfig, executor: E) -> Self {
        Self {
            parser: RequestParser::new(config.limits),
            compiler: MongoCompiler::new(config.ancestry.clone()),
            executor,
        }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn select_units_by_query(&self, query: &str) -> MetadataResult<ResultEnvelope> {
        info!("Select units by query");
        self.run_str(
            query,
            Target {
                kind: RequestKind::Select,
                collection: Collection::Units,
                id: None,
            },
        )
    }

    pub fn select_units_by_id(&self, query: &str, unit_id: &str) -> MetadataResult<ResultEnvelope> {
        info!(unit_id, "Select units by id");
        self.run_str(
            query,
            Target {
                kind: RequestKind::Select,
                collection: Collection::Units,
                id: Some(unit_id),
            },
        )
    }

    pub fn select_object_group_by_id(
        &self,
        query: &str,
        object_group_id: &str,
    ) -> MetadataResult<ResultEnvelope> {
        info!(object_group_id, "Select object group by id");
        self.run_str(
            query,
            Target {
                kind: RequestKind::Select,
                collection: Collection::ObjectGroups,
                id: Some(object_group_id),
            },
        )
    }

    pub fn update_unit_by_id(&self, query: &str, unit_id: &str) -> MetadataResult<ResultEnvelope> {
        info!(unit_id, "Update unit by id");
        self.run_str(
            query,
            Target {
                kind: RequestKind::Update,
                collection: Collection::Units,
                id: Some(unit_id),
            },
        )
    }

    pub fn insert_unit(&self, request: &Value) -> MetadataResult<ResultEnvelope> {
        info!("Insert unit");
        self.run_value(
            request,
            Target {
                kind: RequestKind::Insert,
                collection: Collection::Units,
                id: None,
            },
        )
    }

    pub fn insert_object_group(&self, request: &Value) -> MetadataResult<ResultEnvelope> {
        info!("Insert object group");
        self.run_value(
            request,
            Target {
                kind: RequestKind::Insert,
                collection: Collection::ObjectGroups,
                id: None,
            },
        )
    }

    fn run_str(&self, text: &str, target: Target<'_>) -> MetadataResult<ResultEnvelope> {
        let value = self.parser.decode(text)?;
        let request = self.parser.parse_checked(target.kind, &value)?;
        let plan = self.compile(request, value, target)?;
        self.execute(&plan)
    }

    fn run_value(&self, value: &Value, target: Target<'_>) -> MetadataResult<ResultEnvelope> {
        let request = self.parser.parse_value(target.kind, value)?;
        let plan = self.compile(request, value.clone(), target)?;
        self.execute(&plan)
    }

    fn compile(
        &self,
        mut request: QueryRequest,
        context: Value,
        target: Target<'_>,
    ) -> MetadataResult<QueryPlan> {
        if let Some(id) = target.id.filter(|id| !id.is_empty()) {
            debug!(id, "Resetting $roots");
            request.reset_roots([id]);
        }
        let plan = self.compiler.compile_request(&request, target.collection)?;
        debug!(hints = ?plan.hints, collection = %plan.collection, "Plan ready");
        Ok(plan.with_context(context))
    }

    fn execute(&self, plan: &QueryPlan) -> MetadataResult<ResultEnvelope> {
        self.executor.execute(plan).map_err(|err| {
            error!(error = %err, collection = %plan.collection, "Execution failed");
            MetadataError::Execution(err)
        })
    }
}
