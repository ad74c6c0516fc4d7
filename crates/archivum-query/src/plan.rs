//! Compiled requests.
//!
//! A `QueryPlan` is what the executor receives: every step compiled to a
//! backend filter, plus the compiled projection, sort and paging. Scope
//! constraints stay unbound until the executor knows each step's working
//! set, see [`CompiledStep::command`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::Hint;
use crate::depth::{DepthScope, WorkingSetExpansion};
use crate::ir::RequestKind;
use crate::render::{exact_depth_filter, full_command, root_filter};

/// Target collection of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Units,
    ObjectGroups,
}

impl Collection {
    pub fn name(self) -> &'static str {
        match self {
            Collection::Units => "units",
            Collection::ObjectGroups => "objectgroups",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Absolute depth window of an `Exact` scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthRange {
    pub min_field: String,
    pub max_field: String,
    pub depth: u32,
}

/// How a step's working set is turned into a scope constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeBinding {
    /// Field the working set ids are matched against
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth_range: Option<DepthRange>,
}

impl ScopeBinding {
    /// Scope constraint for `working_set`, `None` when nothing constrains
    pub fn bind(&self, working_set: &[String]) -> Option<Value> {
        let root = root_filter(&self.field, working_set);
        match &self.depth_range {
            Some(range) => Some(exact_depth_filter(root, range)),
            None => root,
        }
    }
}

/// One compiled step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledStep {
    pub index: usize,
    pub scope: DepthScope,
    /// What the executor must do to the working set before calling `command`
    pub expansion: WorkingSetExpansion,
    /// Compiled step expression, without scope constraint
    pub query: Value,
    pub binding: ScopeBinding,
}

impl CompiledStep {
    /// Full filter for this step given its working set, already expanded
    /// as `expansion` asks.
    ///
    /// For the first step the working set is the request roots, and an empty
    /// one leaves the step unconstrained. Any later step with an empty
    /// working set cannot match and yields `None`.
    pub fn command(&self, working_set: &[String]) -> Option<Value> {
        if self.index > 0 && working_set.is_empty() {
            return None;
        }
        Some(full_command(self.query.clone(), self.binding.bind(working_set)))
    }
}

/// Compiled request handed to a `QueryExecutor`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPlan {
    pub kind: RequestKind,
    pub collection: Collection,
    pub roots: Vec<String>,
    pub steps: Vec<CompiledStep>,
    /// Identifier field, used for plain lookups when there are no steps
    pub id_field: String,
    pub projection: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
    pub sort: Value,
    pub offset: u64,
    pub limit: u64,
    pub hints: Vec<Hint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Request as received, echoed back in the result envelope
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub context: Value,
}

impl QueryPlan {
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = context;
        self
    }

    pub fn has_hint(&self, hint: Hint) -> bool {
        self.hints.contains(&hint)
    }

    /// Filter of the first step, bound to the request roots.
    ///
    /// `None` when there are no steps, or when the first step needs the
    /// roots expanded before they can be bound.
    pub fn first_command(&self) -> Option<Value> {
        self.steps
            .first()
            .filter(|step| step.expansion == WorkingSetExpansion::None)
            .and_then(|step| step.command(&self.roots))
    }

    /// Filter for a request without steps: the roots themselves, or
    /// everything when there are no roots
    pub fn lookup_command(&self) -> Value {
        root_filter(&self.id_field, &self.roots).unwrap_or_else(|| Value::Object(Default::default()))
    }
}
