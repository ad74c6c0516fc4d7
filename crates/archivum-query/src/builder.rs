//! Constructor functions for query nodes.
//!
//! One function per operator. Each validates its arguments the same way the
//! parser does, so a node built here is indistinguishable from a parsed one.
//!
//! ```
//! use archivum_query::builder::{and, exists, gt};
//!
//! let node = and(vec![exists("Title").unwrap(), gt("Size", 7).unwrap()]).unwrap();
//! assert_eq!(node.operator().token(), "$and");
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::catalog::ReservedField;
use crate::error::{QueryError, QueryResult};
use crate::ir::{
    BooleanOp, ComparisonOp, ContainmentOp, ExistenceOp, FieldValue, FullTextOp, QueryNode,
    RangeBounds, StringMatchOp,
};

/// Plain field names: no leading `$`, `#` or `.`, no NUL, no trailing `.`
static FIELD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^$#.\x00]([^\x00]*[^.\x00])?$").unwrap());

/// Where a field name appears
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldContext {
    Query,
    Projection,
    OrderBy,
}

/// Validate a field name.
///
/// `#` names must be reserved names from the catalog; `#all` is accepted
/// only in projections.
pub fn check_field(name: &str, context: FieldContext) -> QueryResult<()> {
    if name.starts_with('#') {
        let reserved = ReservedField::from_token(name)
            .ok_or_else(|| QueryError::UnknownField(name.to_string()))?;
        if !reserved.queryable() && context != FieldContext::Projection {
            return Err(QueryError::malformed(format!(
                "{} is only valid in $projection",
                name
            )));
        }
        return Ok(());
    }
    if FIELD_RE.is_match(name) {
        Ok(())
    } else {
        Err(QueryError::malformed(format!("invalid field name '{}'", name)))
    }
}

fn field(name: impl Into<String>) -> QueryResult<String> {
    let name = name.into();
    check_field(&name, FieldContext::Query)?;
    Ok(name)
}

/// Scalars only: strings, numbers, booleans
pub fn check_scalar(op: &str, value: &Value) -> QueryResult<()> {
    match value {
        Value::String(_) | Value::Number(_) | Value::Bool(_) => Ok(()),
        other => Err(QueryError::malformed(format!(
            "{} expects a scalar value, got {}",
            op, other
        ))),
    }
}

fn comparison(op: ComparisonOp, name: impl Into<String>, value: Value) -> QueryResult<QueryNode> {
    let token = op.operator().token();
    if op == ComparisonOp::Size {
        if value.as_u64().is_none() {
            return Err(QueryError::malformed(format!(
                "{} expects a non-negative integer, got {}",
                token, value
            )));
        }
    } else {
        check_scalar(token, &value)?;
    }
    Ok(QueryNode::Comparison {
        op,
        field: field(name)?,
        value,
    })
}

pub fn eq(name: impl Into<String>, value: impl Into<Value>) -> QueryResult<QueryNode> {
    comparison(ComparisonOp::Eq, name, value.into())
}

pub fn ne(name: impl Into<String>, value: impl Into<Value>) -> QueryResult<QueryNode> {
    comparison(ComparisonOp::Ne, name, value.into())
}

pub fn gt(name: impl Into<String>, value: impl Into<Value>) -> QueryResult<QueryNode> {
    comparison(ComparisonOp::Gt, name, value.into())
}

pub fn gte(name: impl Into<String>, value: impl Into<Value>) -> QueryResult<QueryNode> {
    comparison(ComparisonOp::Gte, name, value.into())
}

pub fn lt(name: impl Into<String>, value: impl Into<Value>) -> QueryResult<QueryNode> {
    comparison(ComparisonOp::Lt, name, value.into())
}

pub fn lte(name: impl Into<String>, value: impl Into<Value>) -> QueryResult<QueryNode> {
    comparison(ComparisonOp::Lte, name, value.into())
}

/// Array field with exactly `len` elements
pub fn size(name: impl Into<String>, len: u64) -> QueryResult<QueryNode> {
    comparison(ComparisonOp::Size, name, Value::from(len))
}

fn existence(op: ExistenceOp, name: impl Into<String>) -> QueryResult<QueryNode> {
    Ok(QueryNode::Existence {
        op,
        field: field(name)?,
    })
}

pub fn exists(name: impl Into<String>) -> QueryResult<QueryNode> {
    existence(ExistenceOp::Exists, name)
}

pub fn missing(name: impl Into<String>) -> QueryResult<QueryNode> {
    existence(ExistenceOp::Missing, name)
}

pub fn is_null(name: impl Into<String>) -> QueryResult<QueryNode> {
    existence(ExistenceOp::IsNull, name)
}

fn containment(
    op: ContainmentOp,
    name: impl Into<String>,
    values: Vec<Value>,
) -> QueryResult<QueryNode> {
    let token = op.operator().token();
    if values.is_empty() {
        return Err(QueryError::malformed(format!("{} expects a non-empty array", token)));
    }
    for value in &values {
        check_scalar(token, value)?;
    }
    Ok(QueryNode::Containment {
        op,
        field: field(name)?,
        values,
    })
}

pub fn in_values(name: impl Into<String>, values: Vec<Value>) -> QueryResult<QueryNode> {
    containment(ContainmentOp::In, name, values)
}

pub fn nin(name: impl Into<String>, values: Vec<Value>) -> QueryResult<QueryNode> {
    containment(ContainmentOp::Nin, name, values)
}

/// Range over one field; at least one bound, one lower and one upper at most
pub fn range(name: impl Into<String>, bounds: RangeBounds) -> QueryResult<QueryNode> {
    if bounds.is_empty() {
        return Err(QueryError::malformed("$range expects at least one bound"));
    }
    if bounds.gt.is_some() && bounds.gte.is_some() {
        return Err(QueryError::malformed("$range cannot combine $gt and $gte"));
    }
    if bounds.lt.is_some() && bounds.lte.is_some() {
        return Err(QueryError::malformed("$range cannot combine $lt and $lte"));
    }
    for bound in [&bounds.gt, &bounds.gte, &bounds.lt, &bounds.lte].into_iter().flatten() {
        check_scalar("$range", bound)?;
    }
    Ok(QueryNode::Range {
        field: field(name)?,
        bounds,
    })
}

fn pattern(
    op: StringMatchOp,
    name: impl Into<String>,
    value: impl Into<String>,
) -> QueryResult<QueryNode> {
    let value: String = value.into();
    Ok(QueryNode::StringMatch {
        op,
        pairs: vec![FieldValue::new(field(name)?, value)],
    })
}

pub fn wildcard(name: impl Into<String>, value: impl Into<String>) -> QueryResult<QueryNode> {
    pattern(StringMatchOp::Wildcard, name, value)
}

pub fn regex(name: impl Into<String>, value: impl Into<String>) -> QueryResult<QueryNode> {
    pattern(StringMatchOp::Regex, name, value)
}

/// Exact values on one or more fields, combined conjunctively
pub fn term<I, S, V>(pairs: I) -> QueryResult<QueryNode>
where
    I: IntoIterator<Item = (S, V)>,
    S: Into<String>,
    V: Into<Value>,
{
    let pairs = pairs
        .into_iter()
        .map(|(name, value)| -> QueryResult<FieldValue> {
            let value = value.into();
            check_scalar("$term", &value)?;
            Ok(FieldValue {
                field: field(name)?,
                value,
            })
        })
        .collect::<QueryResult<Vec<_>>>()?;
    if pairs.is_empty() {
        return Err(QueryError::malformed("$term expects at least one field"));
    }
    Ok(QueryNode::StringMatch {
        op: StringMatchOp::Term,
        pairs,
    })
}

fn boolean(op: BooleanOp, children: Vec<QueryNode>) -> QueryResult<QueryNode> {
    if children.is_empty() {
        return Err(QueryError::malformed(format!(
            "{} expects at least one sub-query",
            op.operator().token()
        )));
    }
    Ok(QueryNode::Boolean { op, children })
}

pub fn and(children: Vec<QueryNode>) -> QueryResult<QueryNode> {
    boolean(BooleanOp::And, children)
}

pub fn or(children: Vec<QueryNode>) -> QueryResult<QueryNode> {
    boolean(BooleanOp::Or, children)
}

/// Negation of the conjunction of `children`
pub fn not(children: Vec<QueryNode>) -> QueryResult<QueryNode> {
    boolean(BooleanOp::Not, children)
}

fn full_text(
    op: FullTextOp,
    fields: Vec<String>,
    value: impl Into<String>,
) -> QueryResult<QueryNode> {
    if fields.is_empty() {
        return Err(QueryError::malformed(format!(
            "{} expects at least one field",
            op.operator().token()
        )));
    }
    let fields = fields.into_iter().map(field).collect::<QueryResult<Vec<_>>>()?;
    Ok(QueryNode::FullText {
        op,
        fields,
        value: value.into(),
    })
}

pub fn match_text(name: impl Into<String>, value: impl Into<String>) -> QueryResult<QueryNode> {
    full_text(FullTextOp::Match, vec![name.into()], value)
}

pub fn prefix(name: impl Into<String>, value: impl Into<String>) -> QueryResult<QueryNode> {
    full_text(FullTextOp::Prefix, vec![name.into()], value)
}

pub fn search(name: impl Into<String>, value: impl Into<String>) -> QueryResult<QueryNode> {
    full_text(FullTextOp::Search, vec![name.into()], value)
}

/// More-like-this over several fields
pub fn mlt<I, S>(value: impl Into<String>, fields: I) -> QueryResult<QueryNode>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    full_text(
        FullTextOp::Mlt,
        fields.into_iter().map(Into::into).collect(),
        value,
    )
}

/// Explicit traversal through the given ids
pub fn path<I, S>(ids: I) -> QueryResult<QueryNode>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
    if ids.is_empty() {
        return Err(QueryError::malformed("$path expects at least one id"));
    }
    Ok(QueryNode::Path { ids })
}
