use anyhow::{Context, Result};
use archivum_config::ArchivumConfig;
use archivum_query::{
    Collection, FilterCompiler, MongoCompiler, QueryPlan, RequestKind, RequestParser,
};
use serde_json::{json, Value};
use std::path::Path;
use tracing::info;

use crate::input::read_input;

/// Options of the compile subcommand
#[derive(Debug, Clone)]
pub struct CompileOptions {
    pub kind: RequestKind,
    pub collection: Collection,
    /// Replaces the request roots when set and non-empty
    pub id: Option<String>,
}

/// Compile a request and print the plan together with its first command
pub fn execute(config: &ArchivumConfig, input: &Path, options: CompileOptions) -> Result<()> {
    let text = read_input(input)?;
    let output = compile_text(config, &text, &options)?;
    println!(
        "{}",
        serde_json::to_string_pretty(&output).context("Failed to serialize plan")?
    );
    Ok(())
}

/// Compile request text into the printed document
pub fn compile_text(config: &ArchivumConfig, text: &str, options: &CompileOptions) -> Result<Value> {
    let parser = RequestParser::new(config.limits);
    let compiler = MongoCompiler::new(config.ancestry.clone());

    let context = parser.decode(text).context("Failed to decode request")?;
    let mut request = parser
        .parse_value(options.kind, &context)
        .context("Failed to parse request")?;
    if let Some(id) = options.id.as_deref().filter(|id| !id.is_empty()) {
        info!(id, "Resetting $roots");
        request.reset_roots([id]);
    }

    let plan = compiler
        .compile_request(&request, options.collection)
        .context("Failed to compile request")?;

    Ok(json!({
        "command": command(&plan),
        "plan": plan,
    }))
}

/// Filter the executor would run first
fn command(plan: &QueryPlan) -> Value {
    if plan.steps.is_empty() {
        plan.lookup_command()
    } else {
        plan.first_command().unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(collection: Collection, id: Option<&str>) -> CompileOptions {
        CompileOptions {
            kind: RequestKind::Select,
            collection,
            id: id.map(str::to_string),
        }
    }

    #[test]
    fn test_compile_text_with_roots() {
        let output = compile_text(
            &ArchivumConfig::default(),
            r#"{"$roots": ["id0", "id1"], "$query": [{"$exists": "Title"}]}"#,
            &options(Collection::Units, None),
        )
        .unwrap();

        assert_eq!(
            output["command"].to_string(),
            r#"{"$and":[{"Title":{"$exists":true}},{"_up":{"$in":["id0","id1"]}}]}"#
        );
    }

    #[test]
    fn test_compile_text_object_group_by_id() {
        let output = compile_text(
            &ArchivumConfig::default(),
            r#"{"$roots": [], "$query": [], "$filter": [], "$projection": {}}"#,
            &options(Collection::ObjectGroups, Some("og1")),
        )
        .unwrap();

        assert_eq!(output["command"], json!({"_id": "og1"}));
        assert_eq!(output["plan"]["collection"], json!("objectgroups"));
        assert_eq!(output["plan"]["hints"], json!(["objectgroups"]));
    }

    #[test]
    fn test_compile_text_rejects_full_text() {
        let err = compile_text(
            &ArchivumConfig::default(),
            r#"{"$query": [{"$search": {"Title": "x"}}]}"#,
            &options(Collection::Units, None),
        )
        .unwrap_err();

        assert!(format!("{:#}", err).contains("$search"));
    }
}
