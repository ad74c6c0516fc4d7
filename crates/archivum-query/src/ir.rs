//! Request model and query AST.
//!
//! A `QueryRequest` is built once per incoming request by the parser and
//! is immutable afterwards, except for `reset_roots`. Query trees are never
//! shared between requests.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::{Hint, Operator};

/// Request kind, selecting the allowed top-level keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    Select,
    Insert,
    Update,
}

impl RequestKind {
    /// Whether the request carries a `$data` payload
    pub fn is_write(self) -> bool {
        matches!(self, RequestKind::Insert | RequestKind::Update)
    }

    pub fn name(self) -> &'static str {
        match self {
            RequestKind::Select => "select",
            RequestKind::Insert => "insert",
            RequestKind::Update => "update",
        }
    }
}

impl std::fmt::Display for RequestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Parsed request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    kind: RequestKind,
    roots: Vec<String>,
    steps: Vec<QueryStep>,
    filter: Filter,
    projection: Projection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl QueryRequest {
    pub(crate) fn new(
        kind: RequestKind,
        roots: Vec<String>,
        steps: Vec<QueryStep>,
        filter: Filter,
        projection: Projection,
        data: Option<Value>,
    ) -> Self {
        Self {
            kind,
            roots,
            steps,
            filter,
            projection,
            data,
        }
    }

    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    /// Graph entry points, in request order
    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    /// Query steps, in request order
    pub fn steps(&self) -> &[QueryStep] {
        &self.steps
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// Write payload (insert and update requests only)
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// Replace the roots wholesale.
    ///
    /// Used by the owning layer when a path segment pins a specific entity.
    pub fn reset_roots<I, S>(&mut self, roots: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roots = roots.into_iter().map(Into::into).collect();
    }
}

/// One element of `$query`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryStep {
    pub node: QueryNode,
    #[serde(default)]
    pub depth: DepthSpec,
}

impl QueryStep {
    pub fn new(node: QueryNode) -> Self {
        Self {
            node,
            depth: DepthSpec::default(),
        }
    }

    pub fn with_depth(mut self, depth: DepthSpec) -> Self {
        self.depth = depth;
        self
    }
}

/// Graph-distance annotation of a step.
///
/// Positive values scope descendants, negative values ancestors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthSpec {
    /// `$depth`: hops relative to the working set
    Relative(i32),
    /// `$exactdepth`: absolute distance from the top of the graph
    Exact(i32),
}

impl Default for DepthSpec {
    fn default() -> Self {
        DepthSpec::Relative(1)
    }
}

/// Query expression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryNode {
    Comparison {
        op: ComparisonOp,
        field: String,
        value: Value,
    },
    Existence {
        op: ExistenceOp,
        field: String,
    },
    Containment {
        op: ContainmentOp,
        field: String,
        values: Vec<Value>,
    },
    Range {
        field: String,
        bounds: RangeBounds,
    },
    /// Wildcard and regex carry one pair; term carries one or more, combined conjunctively
    StringMatch {
        op: StringMatchOp,
        pairs: Vec<FieldValue>,
    },
    Boolean {
        op: BooleanOp,
        children: Vec<QueryNode>,
    },
    /// Expressible in the language, not compilable by the document-store backend
    FullText {
        op: FullTextOp,
        fields: Vec<String>,
        value: String,
    },
    Path {
        ids: Vec<String>,
    },
}

impl QueryNode {
    /// Catalog operator this node was built from
    pub fn operator(&self) -> Operator {
        match self {
            QueryNode::Comparison { op, .. } => op.operator(),
            QueryNode::Existence { op, .. } => op.operator(),
            QueryNode::Containment { op, .. } => op.operator(),
            QueryNode::Range { .. } => Operator::Range,
            QueryNode::StringMatch { op, .. } => op.operator(),
            QueryNode::Boolean { op, .. } => op.operator(),
            QueryNode::FullText { op, .. } => op.operator(),
            QueryNode::Path { .. } => Operator::Path,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    /// Array length equality
    Size,
}

impl ComparisonOp {
    pub fn operator(self) -> Operator {
        match self {
            ComparisonOp::Eq => Operator::Eq,
            ComparisonOp::Ne => Operator::Ne,
            ComparisonOp::Gt => Operator::Gt,
            ComparisonOp::Gte => Operator::Gte,
            ComparisonOp::Lt => Operator::Lt,
            ComparisonOp::Lte => Operator::Lte,
            ComparisonOp::Size => Operator::Size,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExistenceOp {
    Exists,
    Missing,
    IsNull,
}

impl ExistenceOp {
    pub fn operator(self) -> Operator {
        match self {
            ExistenceOp::Exists => Operator::Exists,
            ExistenceOp::Missing => Operator::Missing,
            ExistenceOp::IsNull => Operator::IsNull,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainmentOp {
    In,
    Nin,
}

impl ContainmentOp {
    pub fn operator(self) -> Operator {
        match self {
            ContainmentOp::In => Operator::In,
            ContainmentOp::Nin => Operator::Nin,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StringMatchOp {
    Wildcard,
    Regex,
    Term,
}

impl StringMatchOp {
    pub fn operator(self) -> Operator {
        match self {
            StringMatchOp::Wildcard => Operator::Wildcard,
            StringMatchOp::Regex => Operator::Regex,
            StringMatchOp::Term => Operator::Term,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BooleanOp {
    And,
    Or,
    Not,
}

impl BooleanOp {
    pub fn operator(self) -> Operator {
        match self {
            BooleanOp::And => Operator::And,
            BooleanOp::Or => Operator::Or,
            BooleanOp::Not => Operator::Not,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FullTextOp {
    Match,
    Mlt,
    Prefix,
    Search,
}

impl FullTextOp {
    pub fn operator(self) -> Operator {
        match self {
            FullTextOp::Match => Operator::Match,
            FullTextOp::Mlt => Operator::Mlt,
            FullTextOp::Prefix => Operator::Prefix,
            FullTextOp::Search => Operator::Search,
        }
    }
}

/// Bounds of a `$range` node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RangeBounds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gt: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gte: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lt: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lte: Option<Value>,
}

impl RangeBounds {
    pub fn is_empty(&self) -> bool {
        self.gt.is_none() && self.gte.is_none() && self.lt.is_none() && self.lte.is_none()
    }
}

/// Field/value pair of a string-match node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldValue {
    pub field: String,
    pub value: Value,
}

impl FieldValue {
    pub fn new(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// `$filter` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub offset: u64,
    pub limit: u64,
    /// Ordered set: insertion order kept, duplicates collapsed
    pub hints: Vec<Hint>,
    pub order_by: Vec<OrderBy>,
}

impl Filter {
    /// Empty filter with the given default limit
    pub fn with_limit(limit: u64) -> Self {
        Self {
            offset: 0,
            limit,
            hints: Vec::new(),
            order_by: Vec::new(),
        }
    }

    pub fn has_hint(&self, hint: Hint) -> bool {
        self.hints.contains(&hint)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Backend sort value: 1 ascending, -1 descending
    pub fn sign(self) -> i32 {
        match self {
            SortDirection::Asc => 1,
            SortDirection::Desc => -1,
        }
    }
}

/// `$projection` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projection {
    pub fields: Vec<ProjectedField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
}

impl Projection {
    /// Fields explicitly included
    pub fn included(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|f| f.include)
            .map(|f| f.field.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectedField {
    pub field: String,
    pub include: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_depth_is_one_hop_down() {
        assert_eq!(DepthSpec::default(), DepthSpec::Relative(1));
        assert_eq!(
            QueryStep::new(QueryNode::Path { ids: vec![] }).depth,
            DepthSpec::Relative(1)
        );
    }

    #[test]
    fn test_reset_roots_replaces_list() {
        let mut request = QueryRequest::new(
            RequestKind::Select,
            vec!["a".to_string(), "b".to_string()],
            vec![],
            Filter::with_limit(10),
            Projection::default(),
            None,
        );

        request.reset_roots(["c"]);

        assert_eq!(request.roots(), &["c".to_string()]);
    }

    #[test]
    fn test_node_operator() {
        let node = QueryNode::Comparison {
            op: ComparisonOp::Size,
            field: "tags".to_string(),
            value: json!(3),
        };
        assert_eq!(node.operator(), Operator::Size);
        assert_eq!(
            QueryNode::FullText {
                op: FullTextOp::Mlt,
                fields: vec!["title".to_string()],
                value: "x".to_string(),
            }
            .operator()
            .token(),
            "$mlt"
        );
    }

    #[test]
    fn test_projection_included() {
        let projection = Projection {
            fields: vec![
                ProjectedField {
                    field: "#dua".to_string(),
                    include: true,
                },
                ProjectedField {
                    field: "Title".to_string(),
                    include: false,
                },
            ],
            usage: None,
        };
        assert_eq!(projection.included().collect::<Vec<_>>(), vec!["#dua"]);
    }

    #[test]
    fn test_node_serializes_with_kind_tag() {
        let node = QueryNode::Existence {
            op: ExistenceOp::Missing,
            field: "mavar2".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&node).unwrap(),
            r#"{"kind":"existence","op":"missing","field":"mavar2"}"#
        );
    }
}
