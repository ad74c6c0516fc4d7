//! Response envelope returned by every metadata entry point.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::plan::QueryPlan;

/// Paging summary of a result set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hits {
    /// Number of matches before paging
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
    /// Number of results actually returned
    pub size: u64,
}

/// `{"$hits": .., "$context": .., "$results": [..]}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    #[serde(rename = "$hits")]
    pub hits: Hits,
    #[serde(rename = "$context")]
    pub context: Value,
    #[serde(rename = "$results")]
    pub results: Vec<Value>,
}

impl ResultEnvelope {
    /// Envelope for `results`, paged as `plan` requested
    pub fn new(plan: &QueryPlan, context: Value, total: u64, results: Vec<Value>) -> Self {
        Self {
            hits: Hits {
                total,
                offset: plan.offset,
                limit: plan.limit,
                size: results.len() as u64,
            },
            context,
            results,
        }
    }

    /// Envelope echoing the plan's own context
    pub fn for_plan(plan: &QueryPlan, total: u64, results: Vec<Value>) -> Self {
        Self::new(plan, plan.context.clone(), total, results)
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
