//! Query step and expression parsing.
//!
//! A step is an object holding one or more operators (several are combined
//! with `$and`) plus optional `$depth` / `$exactdepth` modifiers. Nested
//! expressions follow the same shape without modifiers.

use serde_json::{Map, Value};

use crate::builder;
use crate::catalog::{Operator, StepModifier};
use crate::depth;
use crate::error::{QueryError, QueryResult};
use crate::ir::{DepthSpec, QueryNode, QueryStep, RangeBounds};

/// Parse one element of `$query`
pub fn parse_step(index: usize, value: &Value) -> QueryResult<QueryStep> {
    let obj = value
        .as_object()
        .ok_or_else(|| QueryError::malformed(format!("step {} must be an object", index)))?;

    let depth = parse_modifiers(index, obj)?;

    let operators: Vec<(&String, &Value)> = obj
        .iter()
        .filter(|(key, _)| StepModifier::from_token(key).is_none())
        .collect();
    if operators.is_empty() {
        return Err(QueryError::malformed(format!(
            "step {} has no query operator",
            index
        )));
    }

    Ok(QueryStep::new(combine(operators)?).with_depth(depth))
}

fn parse_modifiers(index: usize, obj: &Map<String, Value>) -> QueryResult<DepthSpec> {
    let relative = obj.get(StepModifier::Depth.token());
    let exact = obj.get(StepModifier::ExactDepth.token());

    let spec = match (relative, exact) {
        (Some(_), Some(_)) => return Err(QueryError::DepthConflict { step: index }),
        (Some(v), None) => DepthSpec::Relative(depth_value(StepModifier::Depth, v)?),
        (None, Some(v)) => DepthSpec::Exact(depth_value(StepModifier::ExactDepth, v)?),
        (None, None) => DepthSpec::default(),
    };
    depth::validate(spec)?;
    Ok(spec)
}

fn depth_value(modifier: StepModifier, value: &Value) -> QueryResult<i32> {
    value
        .as_i64()
        .and_then(|n| i32::try_from(n).ok())
        .ok_or_else(|| {
            QueryError::malformed(format!(
                "{} expects an integer, got {}",
                modifier.token(),
                value
            ))
        })
}

/// Parse a nested expression object (operand of `$and`, `$or`, `$not`)
pub fn parse_expression(value: &Value) -> QueryResult<QueryNode> {
    let obj = value.as_object().ok_or_else(|| {
        QueryError::malformed(format!("sub-query must be an object, got {}", value))
    })?;
    if obj.is_empty() {
        return Err(QueryError::malformed("sub-query has no operator"));
    }
    if let Some(key) = obj.keys().find(|k| StepModifier::from_token(k).is_some()) {
        return Err(QueryError::malformed(format!(
            "{} is only valid at step level",
            key
        )));
    }
    combine(obj.iter().collect())
}

fn combine(operators: Vec<(&String, &Value)>) -> QueryResult<QueryNode> {
    let mut nodes = operators
        .into_iter()
        .map(|(key, value)| parse_operator(key, value))
        .collect::<QueryResult<Vec<_>>>()?;
    if nodes.len() == 1 {
        Ok(nodes.remove(0))
    } else {
        builder::and(nodes)
    }
}

fn parse_operator(token: &str, value: &Value) -> QueryResult<QueryNode> {
    let op = Operator::from_token(token).ok_or_else(|| {
        if token.starts_with('$') {
            QueryError::UnknownOperatorToken(token.to_string())
        } else {
            QueryError::malformed(format!("expected an operator, found '{}'", token))
        }
    })?;

    match op {
        Operator::Exists | Operator::Missing | Operator::IsNull => {
            let field = expect_str(op, value)?;
            match op {
                Operator::Exists => builder::exists(field),
                Operator::Missing => builder::missing(field),
                _ => builder::is_null(field),
            }
        }
        Operator::And | Operator::Or | Operator::Not => {
            let children = expect_array(op, value)?
                .iter()
                .map(parse_expression)
                .collect::<QueryResult<Vec<_>>>()?;
            match op {
                Operator::And => builder::and(children),
                Operator::Or => builder::or(children),
                _ => builder::not(children),
            }
        }
        Operator::Eq
        | Operator::Ne
        | Operator::Gt
        | Operator::Gte
        | Operator::Lt
        | Operator::Lte => {
            let (field, operand) = single_field(op, value)?;
            let operand = operand.clone();
            match op {
                Operator::Eq => builder::eq(field, operand),
                Operator::Ne => builder::ne(field, operand),
                Operator::Gt => builder::gt(field, operand),
                Operator::Gte => builder::gte(field, operand),
                Operator::Lt => builder::lt(field, operand),
                _ => builder::lte(field, operand),
            }
        }
        Operator::Size => {
            let (field, operand) = single_field(op, value)?;
            let len = operand.as_u64().ok_or_else(|| {
                QueryError::malformed(format!(
                    "$size expects a non-negative integer, got {}",
                    operand
                ))
            })?;
            builder::size(field, len)
        }
        Operator::In | Operator::Nin => {
            let (field, operand) = single_field(op, value)?;
            let values = expect_array(op, operand)?.clone();
            if op == Operator::In {
                builder::in_values(field, values)
            } else {
                builder::nin(field, values)
            }
        }
        Operator::Range => {
            let (field, operand) = single_field(op, value)?;
            builder::range(field, parse_bounds(operand)?)
        }
        Operator::Wildcard | Operator::Regex => {
            let (field, operand) = single_field(op, value)?;
            let pattern = expect_str(op, operand)?;
            if op == Operator::Wildcard {
                builder::wildcard(field, pattern)
            } else {
                builder::regex(field, pattern)
            }
        }
        Operator::Term => {
            let pairs = expect_object(op, value)?
                .iter()
                .map(|(field, v)| (field.clone(), v.clone()));
            builder::term(pairs)
        }
        Operator::Match | Operator::Prefix | Operator::Search => {
            let (field, operand) = single_field(op, value)?;
            let text = expect_str(op, operand)?;
            match op {
                Operator::Match => builder::match_text(field, text),
                Operator::Prefix => builder::prefix(field, text),
                _ => builder::search(field, text),
            }
        }
        Operator::Mlt => parse_mlt(value),
        Operator::Path => {
            let ids = expect_array(op, value)?
                .iter()
                .map(|id| expect_str(op, id).map(str::to_string))
                .collect::<QueryResult<Vec<_>>>()?;
            builder::path(ids)
        }
    }
}

/// `{ "$mlt": { "$fields": [..], "$like": "text" } }`
fn parse_mlt(value: &Value) -> QueryResult<QueryNode> {
    let obj = expect_object(Operator::Mlt, value)?;
    let mut fields = None;
    let mut like = None;
    for (key, v) in obj {
        match key.as_str() {
            "$fields" => {
                let names = expect_array(Operator::Mlt, v)?
                    .iter()
                    .map(|f| expect_str(Operator::Mlt, f).map(str::to_string))
                    .collect::<QueryResult<Vec<_>>>()?;
                fields = Some(names);
            }
            "$like" => like = Some(expect_str(Operator::Mlt, v)?),
            other => {
                return Err(QueryError::malformed(format!(
                    "$mlt does not accept '{}'",
                    other
                )))
            }
        }
    }
    match (fields, like) {
        (Some(fields), Some(like)) => builder::mlt(like, fields),
        _ => Err(QueryError::malformed("$mlt expects $fields and $like")),
    }
}

fn parse_bounds(value: &Value) -> QueryResult<RangeBounds> {
    let mut bounds = RangeBounds::default();
    for (key, bound) in expect_object(Operator::Range, value)? {
        let slot = match Operator::from_token(key) {
            Some(Operator::Gt) => &mut bounds.gt,
            Some(Operator::Gte) => &mut bounds.gte,
            Some(Operator::Lt) => &mut bounds.lt,
            Some(Operator::Lte) => &mut bounds.lte,
            _ => {
                return Err(QueryError::malformed(format!(
                    "$range does not accept '{}'",
                    key
                )))
            }
        };
        *slot = Some(bound.clone());
    }
    Ok(bounds)
}

fn single_field(op: Operator, value: &Value) -> QueryResult<(&str, &Value)> {
    let obj = expect_object(op, value)?;
    let mut entries = obj.iter();
    match (entries.next(), entries.next()) {
        (Some((field, operand)), None) => Ok((field.as_str(), operand)),
        _ => Err(QueryError::malformed(format!(
            "{} expects exactly one field, got {}",
            op.token(),
            obj.len()
        ))),
    }
}

fn expect_object(op: Operator, value: &Value) -> QueryResult<&Map<String, Value>> {
    value.as_object().ok_or_else(|| {
        QueryError::malformed(format!("{} expects an object, got {}", op.token(), value))
    })
}

fn expect_array(op: Operator, value: &Value) -> QueryResult<&Vec<Value>> {
    value.as_array().ok_or_else(|| {
        QueryError::malformed(format!("{} expects an array, got {}", op.token(), value))
    })
}

fn expect_str(op: Operator, value: &Value) -> QueryResult<&str> {
    value.as_str().ok_or_else(|| {
        QueryError::malformed(format!("{} expects a string, got {}", op.token(), value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BooleanOp, ComparisonOp, ExistenceOp, FullTextOp, StringMatchOp};
    use serde_json::json;
    use test_case::test_case;

    #[test]
    fn test_single_operator_step() {
        let step = parse_step(0, &json!({"$exists": "mavar1"})).unwrap();
        assert_eq!(step.depth, DepthSpec::Relative(1));
        assert_eq!(
            step.node,
            QueryNode::Existence {
                op: ExistenceOp::Exists,
                field: "mavar1".to_string(),
            }
        );
    }

    #[test]
    fn test_multiple_operators_become_and() {
        let step = parse_step(0, &json!({"$exists": "a", "$missing": "b"})).unwrap();
        match step.node {
            QueryNode::Boolean { op, children } => {
                assert_eq!(op, BooleanOp::And);
                assert_eq!(children.len(), 2);
            }
            other => panic!("expected $and, got {:?}", other),
        }
    }

    #[test]
    fn test_depth_modifiers() {
        let step = parse_step(3, &json!({"$regex": {"mavar14": "^start?aa.*"}, "$depth": -1})).unwrap();
        assert_eq!(step.depth, DepthSpec::Relative(-1));

        let step = parse_step(2, &json!({"$not": [{"$gt": {"mavar6": 7}}], "$exactdepth": 4})).unwrap();
        assert_eq!(step.depth, DepthSpec::Exact(4));
    }

    #[test]
    fn test_depth_conflict() {
        let err = parse_step(
            5,
            &json!({"$eq": {"a": 1}, "$depth": 1, "$exactdepth": 2}),
        )
        .unwrap_err();
        assert_eq!(err, QueryError::DepthConflict { step: 5 });
    }

    #[test]
    fn test_depth_conflict_wins_over_operator_errors() {
        let err = parse_step(0, &json!({"$bogus": 1, "$depth": 1, "$exactdepth": 2})).unwrap_err();
        assert_eq!(err, QueryError::DepthConflict { step: 0 });
    }

    #[test_case(json!({"$exists": "a", "$depth": "2", "$exactdepth": 3}) ; "invalid depth value")]
    #[test_case(json!({"$exists": "a", "$depth": 1, "$exactdepth": -7}) ; "invalid exact value")]
    #[test_case(json!({"$bogus": 1, "$depth": 0, "$exactdepth": 0}) ; "invalid operator and values")]
    fn test_depth_conflict_wins_over_value_errors(step: Value) {
        assert_eq!(
            parse_step(4, &step).unwrap_err(),
            QueryError::DepthConflict { step: 4 }
        );
    }

    #[test_case(json!({"$exists": "a", "$depth": 0}) ; "zero depth")]
    #[test_case(json!({"$exists": "a", "$exactdepth": -1}) ; "negative exact depth")]
    fn test_meaningless_depth_rejected(step: Value) {
        assert!(matches!(
            parse_step(0, &step),
            Err(QueryError::MalformedRequest(_))
        ));
    }

    #[test]
    fn test_exact_depth_zero_is_top_level() {
        let step = parse_step(0, &json!({"$exists": "a", "$exactdepth": 0})).unwrap();
        assert_eq!(step.depth, DepthSpec::Exact(0));
    }

    #[test]
    fn test_non_integer_depth() {
        assert!(matches!(
            parse_step(0, &json!({"$exists": "a", "$depth": "2"})),
            Err(QueryError::MalformedRequest(_))
        ));
        assert!(matches!(
            parse_step(0, &json!({"$exists": "a", "$depth": 1.5})),
            Err(QueryError::MalformedRequest(_))
        ));
    }

    #[test]
    fn test_modifier_only_step() {
        assert!(matches!(
            parse_step(0, &json!({"$depth": 2})),
            Err(QueryError::MalformedRequest(_))
        ));
    }

    #[test]
    fn test_nested_modifier_rejected() {
        let err = parse_step(0, &json!({"$and": [{"$exists": "a", "$depth": 2}]})).unwrap_err();
        assert!(matches!(err, QueryError::MalformedRequest(_)));
    }

    #[test]
    fn test_unknown_operator() {
        let err = parse_step(
            0,
            &json!({"$or": [{"$exists": "#id"}, {"$badRquest": "mavar3"}]}),
        )
        .unwrap_err();
        assert_eq!(err, QueryError::UnknownOperatorToken("$badRquest".to_string()));
    }

    #[test]
    fn test_field_instead_of_operator() {
        assert!(matches!(
            parse_step(0, &json!({"mavar1": 3})),
            Err(QueryError::MalformedRequest(_))
        ));
    }

    #[test]
    fn test_comparison_needs_exactly_one_field() {
        assert!(parse_step(0, &json!({"$gt": {"a": 1, "b": 2}})).is_err());
        assert!(parse_step(0, &json!({"$gt": {}})).is_err());
    }

    #[test]
    fn test_size_and_containment() {
        let step = parse_step(0, &json!({"$size": {"mavar5": 5}})).unwrap();
        assert_eq!(
            step.node,
            QueryNode::Comparison {
                op: ComparisonOp::Size,
                field: "mavar5".to_string(),
                value: json!(5),
            }
        );

        let step = parse_step(0, &json!({"$nin": {"mavar5": ["maval2", true]}})).unwrap();
        assert_eq!(step.node.operator(), Operator::Nin);
    }

    #[test]
    fn test_range_bounds() {
        let step = parse_step(0, &json!({"$range": {"mavar10": {"$gte": 12, "$lte": 20}}})).unwrap();
        match step.node {
            QueryNode::Range { field, bounds } => {
                assert_eq!(field, "mavar10");
                assert_eq!(bounds.gte, Some(json!(12)));
                assert_eq!(bounds.lte, Some(json!(20)));
                assert_eq!(bounds.gt, None);
            }
            other => panic!("expected range, got {:?}", other),
        }

        assert!(parse_step(0, &json!({"$range": {"mavar10": {"$eq": 1}}})).is_err());
    }

    #[test]
    fn test_term_pairs() {
        let step = parse_step(
            0,
            &json!({"$term": {"mavar14": "motMajuscule", "mavar15": "simplemot"}}),
        )
        .unwrap();
        match step.node {
            QueryNode::StringMatch { op, pairs } => {
                assert_eq!(op, StringMatchOp::Term);
                assert_eq!(pairs.len(), 2);
            }
            other => panic!("expected term, got {:?}", other),
        }
    }

    #[test]
    fn test_full_text_parses() {
        let step = parse_step(0, &json!({"$mlt": {"$fields": ["var1", "var2"], "$like": "value"}})).unwrap();
        assert_eq!(
            step.node,
            QueryNode::FullText {
                op: FullTextOp::Mlt,
                fields: vec!["var1".to_string(), "var2".to_string()],
                value: "value".to_string(),
            }
        );

        let step = parse_step(0, &json!({"$prefix": {"var1": "va"}})).unwrap();
        assert_eq!(step.node.operator(), Operator::Prefix);
    }

    #[test]
    fn test_path_ids() {
        let step = parse_step(0, &json!({"$path": ["id1", "id2"]})).unwrap();
        assert_eq!(
            step.node,
            QueryNode::Path {
                ids: vec!["id1".to_string(), "id2".to_string()],
            }
        );
        assert!(parse_step(0, &json!({"$path": ["id1", 2]})).is_err());
        assert!(parse_step(0, &json!({"$path": []})).is_err());
    }

    #[test]
    fn test_unknown_reserved_field() {
        assert_eq!(
            parse_step(0, &json!({"$exists": "#nope"})).unwrap_err(),
            QueryError::UnknownField("#nope".to_string())
        );
    }
}
