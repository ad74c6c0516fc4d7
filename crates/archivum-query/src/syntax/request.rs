//! Top-level request parsing: `$roots`, `$query`, `$filter`, `$projection`, `$data`.

use archivum_config::QueryLimits;
use serde_json::{Map, Value};
use tracing::debug;

use super::node::parse_step;
use crate::builder::{check_field, FieldContext};
use crate::catalog::{FilterKey, Hint, ProjectionKey, RequestKey};
use crate::error::{QueryError, QueryResult};
use crate::ir::{
    Filter, OrderBy, ProjectedField, Projection, QueryRequest, QueryStep, RequestKind,
    SortDirection,
};

const SELECT_KEYS: [RequestKey; 4] = [
    RequestKey::Roots,
    RequestKey::Query,
    RequestKey::Filter,
    RequestKey::Projection,
];

const WRITE_KEYS: [RequestKey; 4] = [
    RequestKey::Roots,
    RequestKey::Query,
    RequestKey::Filter,
    RequestKey::Data,
];

fn allowed_keys(kind: RequestKind) -> &'static [RequestKey] {
    match kind {
        RequestKind::Select => &SELECT_KEYS,
        RequestKind::Insert | RequestKind::Update => &WRITE_KEYS,
    }
}

pub(crate) fn parse_request(
    kind: RequestKind,
    value: &Value,
    limits: &QueryLimits,
) -> QueryResult<QueryRequest> {
    let obj = value
        .as_object()
        .ok_or_else(|| QueryError::malformed("request must be a JSON object"))?;

    let allowed = allowed_keys(kind);
    for key in obj.keys() {
        match RequestKey::from_token(key) {
            Some(k) if allowed.contains(&k) => {}
            _ => {
                return Err(QueryError::malformed(format!(
                    "'{}' is not allowed in a {} request",
                    key, kind
                )))
            }
        }
    }

    let roots = match obj.get(RequestKey::Roots.token()) {
        Some(v) => parse_roots(v)?,
        None => Vec::new(),
    };
    let steps = match obj.get(RequestKey::Query.token()) {
        Some(v) => parse_query(v)?,
        None => Vec::new(),
    };
    let filter = match obj.get(RequestKey::Filter.token()) {
        Some(v) => parse_filter(v, limits)?,
        None => Filter::with_limit(limits.default_limit),
    };
    let projection = match obj.get(RequestKey::Projection.token()) {
        Some(v) => parse_projection(v)?,
        None => Projection::default(),
    };
    let data = if kind.is_write() {
        match obj.get(RequestKey::Data.token()) {
            Some(Value::Object(data)) => Some(Value::Object(data.clone())),
            Some(other) => {
                return Err(QueryError::malformed(format!(
                    "$data must be an object, got {}",
                    other
                )))
            }
            None => {
                return Err(QueryError::malformed(format!(
                    "$data is required in a {} request",
                    kind
                )))
            }
        }
    } else {
        None
    };

    Ok(QueryRequest::new(kind, roots, steps, filter, projection, data))
}

fn parse_roots(value: &Value) -> QueryResult<Vec<String>> {
    let items = value
        .as_array()
        .ok_or_else(|| QueryError::malformed("$roots must be an array of ids"))?;
    items
        .iter()
        .map(|item| {
            item.as_str().map(str::to_string).ok_or_else(|| {
                QueryError::malformed(format!("$roots entries must be strings, got {}", item))
            })
        })
        .collect()
}

fn parse_query(value: &Value) -> QueryResult<Vec<QueryStep>> {
    match value {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| parse_step(index, item))
            .collect(),
        Value::Object(_) => Ok(vec![parse_step(0, value)?]),
        other => Err(QueryError::malformed(format!(
            "$query must be an array or an object, got {}",
            other
        ))),
    }
}

/// Object, or an empty array standing for an empty object
fn section<'a>(name: &str, value: &'a Value) -> QueryResult<Option<&'a Map<String, Value>>> {
    match value {
        Value::Object(obj) => Ok(Some(obj)),
        Value::Array(items) if items.is_empty() => Ok(None),
        other => Err(QueryError::malformed(format!(
            "{} must be an object, got {}",
            name, other
        ))),
    }
}

fn parse_filter(value: &Value, limits: &QueryLimits) -> QueryResult<Filter> {
    let mut filter = Filter::with_limit(limits.default_limit);
    let Some(obj) = section(RequestKey::Filter.token(), value)? else {
        return Ok(filter);
    };

    for (key, v) in obj {
        let filter_key = FilterKey::from_token(key).ok_or_else(|| {
            QueryError::malformed(format!("'{}' is not allowed in $filter", key))
        })?;
        match filter_key {
            FilterKey::Offset => {
                filter.offset = v.as_u64().ok_or_else(|| {
                    QueryError::malformed(format!(
                        "$offset expects a non-negative integer, got {}",
                        v
                    ))
                })?;
            }
            FilterKey::Limit => {
                let requested = v.as_u64().filter(|n| *n > 0).ok_or_else(|| {
                    QueryError::malformed(format!("$limit expects a positive integer, got {}", v))
                })?;
                if requested > limits.default_limit {
                    debug!(
                        requested,
                        max = limits.default_limit,
                        "Clamping $limit to the configured maximum"
                    );
                }
                filter.limit = requested.min(limits.default_limit);
            }
            FilterKey::Hint => filter.hints = parse_hints(v)?,
            FilterKey::OrderBy => filter.order_by = parse_order_by(v)?,
        }
    }

    Ok(filter)
}

fn parse_hints(value: &Value) -> QueryResult<Vec<Hint>> {
    let items = value
        .as_array()
        .ok_or_else(|| QueryError::malformed("$hint must be an array of hint names"))?;
    let mut hints = Vec::with_capacity(items.len());
    for item in items {
        let hint = item
            .as_str()
            .and_then(Hint::from_token)
            .ok_or_else(|| QueryError::malformed(format!("unknown hint {}", item)))?;
        if !hints.contains(&hint) {
            hints.push(hint);
        }
    }
    Ok(hints)
}

fn parse_order_by(value: &Value) -> QueryResult<Vec<OrderBy>> {
    let obj = value
        .as_object()
        .ok_or_else(|| QueryError::malformed("$orderby must be an object"))?;
    obj.iter()
        .map(|(field, direction)| {
            check_field(field, FieldContext::OrderBy)?;
            let direction = match direction.as_i64() {
                Some(1) => SortDirection::Asc,
                Some(-1) => SortDirection::Desc,
                _ => {
                    return Err(QueryError::malformed(format!(
                        "$orderby expects 1 or -1 for '{}', got {}",
                        field, direction
                    )))
                }
            };
            Ok(OrderBy {
                field: field.clone(),
                direction,
            })
        })
        .collect()
}

fn parse_projection(value: &Value) -> QueryResult<Projection> {
    let mut projection = Projection::default();
    let Some(obj) = section(RequestKey::Projection.token(), value)? else {
        return Ok(projection);
    };

    for (key, v) in obj {
        let projection_key = ProjectionKey::from_token(key).ok_or_else(|| {
            QueryError::malformed(format!("'{}' is not allowed in $projection", key))
        })?;
        match projection_key {
            ProjectionKey::Fields => projection.fields = parse_projected_fields(v)?,
            ProjectionKey::Usage => {
                let usage = v.as_str().ok_or_else(|| {
                    QueryError::malformed(format!("$usage expects a string, got {}", v))
                })?;
                projection.usage = Some(usage.to_string());
            }
        }
    }

    Ok(projection)
}

fn parse_projected_fields(value: &Value) -> QueryResult<Vec<ProjectedField>> {
    let obj = value
        .as_object()
        .ok_or_else(|| QueryError::malformed("$fields must be an object"))?;
    obj.iter()
        .map(|(field, flag)| {
            check_field(field, FieldContext::Projection)?;
            let include = match flag {
                Value::Bool(b) => *b,
                other => match other.as_i64() {
                    Some(1) => true,
                    Some(0) => false,
                    _ => {
                        return Err(QueryError::malformed(format!(
                            "$fields expects 0 or 1 for '{}', got {}",
                            field, other
                        )))
                    }
                },
            };
            Ok(ProjectedField {
                field: field.clone(),
                include,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::DepthSpec;
    use serde_json::json;
    use test_case::test_case;

    fn select(value: Value) -> QueryResult<QueryRequest> {
        parse_request(RequestKind::Select, &value, &QueryLimits::default())
    }

    #[test]
    fn test_minimal_select() {
        let request = select(json!({})).unwrap();
        assert!(request.roots().is_empty());
        assert!(request.steps().is_empty());
        assert_eq!(request.filter().limit, 10_000);
        assert_eq!(request.filter().offset, 0);
        assert!(request.data().is_none());
    }

    #[test]
    fn test_single_object_query() {
        let request = select(json!({"$query": {"$eq": {"Title": "x"}, "$depth": 3}})).unwrap();
        assert_eq!(request.steps().len(), 1);
        assert_eq!(request.steps()[0].depth, DepthSpec::Relative(3));
    }

    #[test]
    fn test_empty_array_sections() {
        let request = select(json!({"$roots": [], "$query": [], "$filter": [], "$projection": []}))
            .unwrap();
        assert_eq!(request.filter(), &Filter::with_limit(10_000));
        assert_eq!(request.projection(), &Projection::default());
    }

    #[test_case(json!({"$action": []}) ; "unknown top-level key")]
    #[test_case(json!({"$data": {}}) ; "data in select")]
    #[test_case(json!([]) ; "not an object")]
    #[test_case(json!({"$roots": "id0"}) ; "roots not an array")]
    #[test_case(json!({"$roots": [1]}) ; "root not a string")]
    #[test_case(json!({"$query": "x"}) ; "query not array or object")]
    #[test_case(json!({"$filter": {"$skip": 1}}) ; "unknown filter key")]
    #[test_case(json!({"$filter": {"$hint": ["index"]}}) ; "unknown hint")]
    #[test_case(json!({"$filter": {"$limit": 0}}) ; "zero limit")]
    #[test_case(json!({"$filter": {"$offset": -1}}) ; "negative offset")]
    #[test_case(json!({"$filter": {"$orderby": {"a": 2}}}) ; "bad sort direction")]
    #[test_case(json!({"$projection": {"$fields": {"a": 2}}}) ; "bad projection flag")]
    #[test_case(json!({"$projection": {"$usage": 1}}) ; "usage not a string")]
    #[test_case(json!({"$projection": [1]}) ; "non-empty array projection")]
    fn test_malformed_select(request: Value) {
        assert!(matches!(select(request), Err(QueryError::MalformedRequest(_))));
    }

    #[test]
    fn test_unknown_reserved_field_in_projection() {
        assert_eq!(
            select(json!({"$projection": {"$fields": {"#foo": 1}}})).unwrap_err(),
            QueryError::UnknownField("#foo".to_string())
        );
    }

    #[test]
    fn test_filter_fields() {
        let request = select(json!({
            "$filter": {
                "$offset": 100,
                "$limit": 1000,
                "$hint": ["cache", "cache", "units"],
                "$orderby": {"maclef1": 1, "maclef2": -1}
            }
        }))
        .unwrap();
        let filter = request.filter();
        assert_eq!(filter.offset, 100);
        assert_eq!(filter.limit, 1000);
        assert_eq!(filter.hints, vec![Hint::Cache, Hint::Units]);
        assert_eq!(filter.order_by[0].direction, SortDirection::Asc);
        assert_eq!(filter.order_by[1].field, "maclef2");
        assert_eq!(filter.order_by[1].direction, SortDirection::Desc);
    }

    #[test]
    fn test_limit_is_clamped() {
        let limits = QueryLimits::default().with_default_limit(50);
        let request = parse_request(
            RequestKind::Select,
            &json!({"$filter": {"$limit": 1000}}),
            &limits,
        )
        .unwrap();
        assert_eq!(request.filter().limit, 50);
    }

    #[test]
    fn test_projection_fields() {
        let request = select(json!({
            "$projection": {"$fields": {"#dua": 1, "#all": true, "Title": 0}, "$usage": "abcdef1234"}
        }))
        .unwrap();
        let projection = request.projection();
        assert_eq!(projection.included().collect::<Vec<_>>(), vec!["#dua", "#all"]);
        assert_eq!(projection.usage.as_deref(), Some("abcdef1234"));
    }

    #[test]
    fn test_insert_requires_data() {
        let limits = QueryLimits::default();
        assert!(matches!(
            parse_request(RequestKind::Insert, &json!({"$roots": []}), &limits),
            Err(QueryError::MalformedRequest(_))
        ));
        assert!(matches!(
            parse_request(RequestKind::Insert, &json!({"$data": []}), &limits),
            Err(QueryError::MalformedRequest(_))
        ));
        assert!(matches!(
            parse_request(
                RequestKind::Insert,
                &json!({"$data": {}, "$projection": {}}),
                &limits
            ),
            Err(QueryError::MalformedRequest(_))
        ));

        let request = parse_request(
            RequestKind::Update,
            &json!({"$roots": ["u1"], "$data": {"Title": "new"}}),
            &limits,
        )
        .unwrap();
        assert_eq!(request.kind(), RequestKind::Update);
        assert_eq!(request.data(), Some(&json!({"Title": "new"})));
    }

    #[test]
    fn test_step_index_reported() {
        let err = select(json!({
            "$query": [
                {"$exists": "a"},
                {"$exists": "b", "$depth": 1, "$exactdepth": 1}
            ]
        }))
        .unwrap_err();
        assert_eq!(err, QueryError::DepthConflict { step: 1 });
    }
}
