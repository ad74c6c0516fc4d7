//! Document-store (MongoDB) filter compiler.
//!
//! Emits filter documents as `serde_json::Value` objects. Key order inside
//! every emitted document is fixed, so two compilations of the same request
//! serialize identically.

use archivum_config::AncestryFields;
use serde_json::{Map, Value};
use tracing::debug;

use super::fields::FieldMapper;
use super::FilterCompiler;
use crate::catalog::Hint;
use crate::depth::{self, DepthScope};
use crate::error::{QueryError, QueryResult};
use crate::ir::{
    BooleanOp, ComparisonOp, ExistenceOp, FieldValue, OrderBy, Projection, QueryNode,
    QueryRequest, RangeBounds, StringMatchOp,
};
use crate::plan::{Collection, CompiledStep, DepthRange, QueryPlan, ScopeBinding};

/// BSON type number of `null`
const BSON_NULL: i32 = 10;

/// Single-key document
fn doc(key: impl Into<String>, value: impl Into<Value>) -> Value {
    let mut map = Map::with_capacity(1);
    map.insert(key.into(), value.into());
    Value::Object(map)
}

/// Filter restricting `field` to `ids`.
///
/// No ids means no constraint. One id is a plain equality, several an `$in`
/// in input order (duplicates kept).
pub fn root_filter(field: &str, ids: &[String]) -> Option<Value> {
    match ids {
        [] => None,
        [id] => Some(doc(field, id.clone())),
        _ => Some(doc(
            field,
            doc(
                "$in",
                ids.iter().cloned().map(Value::String).collect::<Vec<_>>(),
            ),
        )),
    }
}

/// Combine a step expression with its scope constraint
pub fn full_command(query: Value, root: Option<Value>) -> Value {
    match root {
        Some(root) => doc("$and", vec![query, root]),
        None => query,
    }
}

/// `Exact` scope constraint: optional root part plus the depth window
pub fn exact_depth_filter(root: Option<Value>, range: &DepthRange) -> Value {
    let mut clauses = Vec::with_capacity(3);
    clauses.extend(root);
    clauses.push(doc(&range.min_field, doc("$lte", range.depth)));
    clauses.push(doc(&range.max_field, doc("$gte", range.depth)));
    doc("$and", clauses)
}

/// Compiler for the document-store backend
#[derive(Debug, Clone, Default)]
pub struct MongoCompiler {
    fields: FieldMapper,
}

impl MongoCompiler {
    pub fn new(ancestry: AncestryFields) -> Self {
        Self {
            fields: FieldMapper::new(ancestry),
        }
    }

    pub fn fields(&self) -> &FieldMapper {
        &self.fields
    }

    fn field(&self, name: &str) -> String {
        self.fields.query_field(name)
    }

    fn compile_range(&self, field: &str, bounds: &RangeBounds) -> Value {
        let mut map = Map::new();
        let ordered = [
            ("$gt", &bounds.gt),
            ("$gte", &bounds.gte),
            ("$lt", &bounds.lt),
            ("$lte", &bounds.lte),
        ];
        for (token, bound) in ordered {
            if let Some(value) = bound {
                map.insert(token.to_string(), value.clone());
            }
        }
        doc(self.field(field), Value::Object(map))
    }

    fn compile_string_match(&self, op: StringMatchOp, pairs: &[FieldValue]) -> QueryResult<Value> {
        match op {
            StringMatchOp::Wildcard | StringMatchOp::Regex => {
                let [pair] = pairs else {
                    return Err(QueryError::malformed(format!(
                        "{} expects exactly one field",
                        op.operator().token()
                    )));
                };
                let mut pattern = Map::with_capacity(2);
                pattern.insert("$regex".to_string(), pair.value.clone());
                pattern.insert("$options".to_string(), Value::String(String::new()));
                Ok(doc(self.field(&pair.field), Value::Object(pattern)))
            }
            StringMatchOp::Term => {
                let mut clauses: Vec<Value> = pairs
                    .iter()
                    .map(|pair| doc(self.field(&pair.field), pair.value.clone()))
                    .collect();
                match clauses.len() {
                    0 => Err(QueryError::malformed("$term expects at least one field")),
                    1 => Ok(clauses.remove(0)),
                    _ => Ok(doc("$and", clauses)),
                }
            }
        }
    }

    fn compile_boolean(&self, op: BooleanOp, children: &[QueryNode]) -> QueryResult<Value> {
        let mut compiled = children
            .iter()
            .map(|child| self.compile_node(child))
            .collect::<QueryResult<Vec<_>>>()?;
        if compiled.is_empty() {
            return Err(QueryError::malformed(format!(
                "{} expects at least one sub-query",
                op.operator().token()
            )));
        }
        Ok(match op {
            BooleanOp::And => doc("$and", compiled),
            BooleanOp::Or => doc("$or", compiled),
            BooleanOp::Not if compiled.len() == 1 => doc("$nor", vec![compiled.remove(0)]),
            BooleanOp::Not => doc("$nor", vec![doc("$and", compiled)]),
        })
    }

    fn compile_step(&self, index: usize, node: &QueryNode, scope: DepthScope) -> QueryResult<CompiledStep> {
        let ancestry = self.fields.ancestry();
        let depth_range = match scope {
            DepthScope::Exact { depth } => Some(DepthRange {
                min_field: ancestry.min_depth.clone(),
                max_field: ancestry.max_depth.clone(),
                depth,
            }),
            _ => None,
        };
        Ok(CompiledStep {
            index,
            scope,
            expansion: scope.expansion(),
            query: self.compile_node(node)?,
            binding: ScopeBinding {
                field: scope.target_field(ancestry).to_string(),
                depth_range,
            },
        })
    }
}

impl FilterCompiler for MongoCompiler {
    fn name(&self) -> &str {
        "mongodb"
    }

    fn compile_node(&self, node: &QueryNode) -> QueryResult<Value> {
        match node {
            QueryNode::Comparison { op, field, value } => {
                let field = self.field(field);
                Ok(match op {
                    ComparisonOp::Eq => doc(field, value.clone()),
                    _ => doc(field, doc(op.operator().token(), value.clone())),
                })
            }
            QueryNode::Existence { op, field } => {
                let field = self.field(field);
                Ok(match op {
                    ExistenceOp::Exists => doc(field, doc("$exists", true)),
                    ExistenceOp::Missing => doc(field, doc("$exists", false)),
                    ExistenceOp::IsNull => doc(field, doc("$type", BSON_NULL)),
                })
            }
            QueryNode::Containment { op, field, values } => Ok(doc(
                self.field(field),
                doc(op.operator().token(), values.clone()),
            )),
            QueryNode::Range { field, bounds } => Ok(self.compile_range(field, bounds)),
            QueryNode::StringMatch { op, pairs } => self.compile_string_match(*op, pairs),
            QueryNode::Boolean { op, children } => self.compile_boolean(*op, children),
            QueryNode::FullText { op, .. } => {
                Err(QueryError::unsupported(op.operator().token()))
            }
            QueryNode::Path { ids } => root_filter(&self.fields.ancestry().id, ids)
                .ok_or_else(|| QueryError::malformed("$path expects at least one id")),
        }
    }

    fn compile_projection(&self, projection: &Projection) -> Value {
        let mut map = Map::new();
        for projected in &projection.fields {
            match self.fields.map(&projected.field) {
                // `#all` selects every field
                None if projected.include => return Value::Object(Map::new()),
                None => {}
                Some(field) => {
                    map.insert(field.to_string(), Value::from(i32::from(projected.include)));
                }
            }
        }
        Value::Object(map)
    }

    fn compile_sort(&self, order_by: &[OrderBy]) -> Value {
        let map = order_by
            .iter()
            .map(|order| (self.field(&order.field), Value::from(order.direction.sign())))
            .collect::<Map<_, _>>();
        Value::Object(map)
    }

    fn compile_request(
        &self,
        request: &QueryRequest,
        collection: Collection,
    ) -> QueryResult<QueryPlan> {
        let steps = request
            .steps()
            .iter()
            .enumerate()
            .map(|(index, step)| {
                let scope = depth::resolve(step.depth)?;
                self.compile_step(index, &step.node, scope)
            })
            .collect::<QueryResult<Vec<_>>>()?;

        let filter = request.filter();
        let mut hints = filter.hints.clone();
        if collection == Collection::ObjectGroups && !hints.contains(&Hint::ObjectGroups) {
            hints.push(Hint::ObjectGroups);
        }

        debug!(
            compiler = self.name(),
            %collection,
            steps = steps.len(),
            roots = request.roots().len(),
            "Compiled request"
        );

        Ok(QueryPlan {
            kind: request.kind(),
            collection,
            roots: request.roots().to_vec(),
            steps,
            id_field: self.fields.ancestry().id.clone(),
            projection: self.compile_projection(request.projection()),
            usage: request.projection().usage.clone(),
            sort: self.compile_sort(&filter.order_by),
            offset: filter.offset,
            limit: filter.limit,
            hints,
            data: request.data().cloned(),
            context: Value::Null,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder;
    use crate::depth::WorkingSetExpansion;
    use crate::ir::{ProjectedField, SortDirection};
    use serde_json::json;
    use test_case::test_case;

    fn compile(node: QueryNode) -> String {
        MongoCompiler::default().compile_node(&node).unwrap().to_string()
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_root_filter() {
        assert_eq!(root_filter("_up", &[]), None);
        assert_eq!(
            root_filter("_up", &ids(&["id0"])).unwrap().to_string(),
            r#"{"_up":"id0"}"#
        );
        assert_eq!(
            root_filter("_up", &ids(&["id0", "id1", "id0"])).unwrap().to_string(),
            r#"{"_up":{"$in":["id0","id1","id0"]}}"#
        );
    }

    #[test]
    fn test_full_command() {
        let query = json!({"Title": "x"});
        assert_eq!(full_command(query.clone(), None), query);
        assert_eq!(
            full_command(query, Some(json!({"_up": "id0"}))).to_string(),
            r#"{"$and":[{"Title":"x"},{"_up":"id0"}]}"#
        );
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(compile(builder::eq("mavar8", 5).unwrap()), r#"{"mavar8":5}"#);
        assert_eq!(compile(builder::ne("mavar9", "ab").unwrap()), r#"{"mavar9":{"$ne":"ab"}}"#);
        assert_eq!(compile(builder::lte("mavar7", 8).unwrap()), r#"{"mavar7":{"$lte":8}}"#);
        assert_eq!(compile(builder::size("mavar5", 5).unwrap()), r#"{"mavar5":{"$size":5}}"#);
    }

    #[test]
    fn test_existence() {
        assert_eq!(compile(builder::exists("mavar1").unwrap()), r#"{"mavar1":{"$exists":true}}"#);
        assert_eq!(compile(builder::missing("mavar2").unwrap()), r#"{"mavar2":{"$exists":false}}"#);
        assert_eq!(compile(builder::is_null("mavar3").unwrap()), r#"{"mavar3":{"$type":10}}"#);
    }

    #[test]
    fn test_containment() {
        assert_eq!(
            compile(builder::in_values("mavar4", vec![json!(1), json!(2), json!("maval1")]).unwrap()),
            r#"{"mavar4":{"$in":[1,2,"maval1"]}}"#
        );
        assert_eq!(
            compile(builder::nin("mavar5", vec![json!("maval2"), json!(true)]).unwrap()),
            r#"{"mavar5":{"$nin":["maval2",true]}}"#
        );
    }

    #[test]
    fn test_range_bound_order() {
        let node = builder::range(
            "mavar10",
            RangeBounds {
                lte: Some(json!(20)),
                gte: Some(json!(12)),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(compile(node), r#"{"mavar10":{"$gte":12,"$lte":20}}"#);
    }

    #[test]
    fn test_wildcard_and_regex() {
        assert_eq!(
            compile(builder::wildcard("mavar14", "motMajuscule").unwrap()),
            r#"{"mavar14":{"$regex":"motMajuscule","$options":""}}"#
        );
        assert_eq!(
            compile(builder::regex("mavar14", "^start?aa.*").unwrap()),
            r#"{"mavar14":{"$regex":"^start?aa.*","$options":""}}"#
        );
    }

    #[test]
    fn test_term() {
        assert_eq!(compile(builder::term([("mavar12", "abc")]).unwrap()), r#"{"mavar12":"abc"}"#);
        assert_eq!(
            compile(builder::term([("mavar12", "abc"), ("mavar13", "def")]).unwrap()),
            r#"{"$and":[{"mavar12":"abc"},{"mavar13":"def"}]}"#
        );
    }

    #[test]
    fn test_boolean() {
        let a = || builder::exists("a").unwrap();
        let b = || builder::gt("b", 1).unwrap();
        assert_eq!(
            compile(builder::or(vec![a(), b()]).unwrap()),
            r#"{"$or":[{"a":{"$exists":true}},{"b":{"$gt":1}}]}"#
        );
        assert_eq!(
            compile(builder::not(vec![a()]).unwrap()),
            r#"{"$nor":[{"a":{"$exists":true}}]}"#
        );
        assert_eq!(
            compile(builder::not(vec![a(), b()]).unwrap()),
            r#"{"$nor":[{"$and":[{"a":{"$exists":true}},{"b":{"$gt":1}}]}]}"#
        );
    }

    #[test_case(builder::match_text("var1", "value").unwrap(), "$match" ; "match")]
    #[test_case(builder::prefix("var1", "va").unwrap(), "$prefix" ; "prefix")]
    #[test_case(builder::search("var1", "value").unwrap(), "$search" ; "search")]
    #[test_case(builder::mlt("value", ["var1", "var2"]).unwrap(), "$mlt" ; "mlt")]
    fn test_full_text_unsupported(node: QueryNode, token: &str) {
        assert_eq!(
            MongoCompiler::default().compile_node(&node),
            Err(QueryError::UnsupportedOperator(token.to_string()))
        );
    }

    #[test]
    fn test_full_text_nested_unsupported() {
        let node = builder::and(vec![
            builder::exists("a").unwrap(),
            builder::prefix("var1", "va").unwrap(),
        ])
        .unwrap();
        assert!(matches!(
            MongoCompiler::default().compile_node(&node),
            Err(QueryError::UnsupportedOperator(_))
        ));
    }

    #[test]
    fn test_path_and_reserved_fields() {
        assert_eq!(compile(builder::path(["id1"]).unwrap()), r#"{"_id":"id1"}"#);
        assert_eq!(
            compile(builder::path(["id1", "id2"]).unwrap()),
            r#"{"_id":{"$in":["id1","id2"]}}"#
        );
        assert_eq!(compile(builder::exists("#dua").unwrap()), r#"{"_dua":{"$exists":true}}"#);
        assert_eq!(compile(builder::eq("#id", "u1").unwrap()), r#"{"_id":"u1"}"#);
    }

    #[test]
    fn test_projection() {
        let compiler = MongoCompiler::default();
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
        assert_eq!(
            compiler.compile_projection(&projection).to_string(),
            r#"{"_dua":1,"Title":0}"#
        );

        let all = Projection {
            fields: vec![
                ProjectedField {
                    field: "#dua".to_string(),
                    include: true,
                },
                ProjectedField {
                    field: "#all".to_string(),
                    include: true,
                },
            ],
            usage: None,
        };
        assert_eq!(compiler.compile_projection(&all), json!({}));
    }

    #[test]
    fn test_sort() {
        let order_by = vec![
            OrderBy {
                field: "maclef1".to_string(),
                direction: SortDirection::Asc,
            },
            OrderBy {
                field: "#min".to_string(),
                direction: SortDirection::Desc,
            },
        ];
        assert_eq!(
            MongoCompiler::default().compile_sort(&order_by).to_string(),
            r#"{"maclef1":1,"_min":-1}"#
        );
    }

    #[test]
    fn test_step_binding_follows_scope() {
        let compiler = MongoCompiler::default();
        let node = builder::exists("a").unwrap();

        let step = compiler.compile_step(0, &node, DepthScope::Children).unwrap();
        assert_eq!(step.binding.field, "_up");
        assert_eq!(step.expansion, WorkingSetExpansion::None);

        let step = compiler
            .compile_step(0, &node, DepthScope::Descendants { hops: 4 })
            .unwrap();
        assert_eq!(step.binding.field, "_up");
        assert_eq!(step.expansion, WorkingSetExpansion::Descendants { hops: 3 });

        let step = compiler
            .compile_step(1, &node, DepthScope::Ancestors { hops: 1 })
            .unwrap();
        assert_eq!(step.binding.field, "_id");
        assert_eq!(
            step.command(&ids(&["p1"])).unwrap().to_string(),
            r#"{"$and":[{"a":{"$exists":true}},{"_id":"p1"}]}"#
        );

        let step = compiler
            .compile_step(0, &node, DepthScope::Exact { depth: 2 })
            .unwrap();
        assert_eq!(
            step.command(&ids(&["r"])).unwrap().to_string(),
            r#"{"$and":[{"a":{"$exists":true}},{"$and":[{"_us":"r"},{"_min":{"$lte":2}},{"_max":{"$gte":2}}]}]}"#
        );
    }
}
