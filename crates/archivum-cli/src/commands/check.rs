use anyhow::{Context, Result};
use archivum_config::ArchivumConfig;
use archivum_query::{Collection, FilterCompiler, MongoCompiler, RequestKind, RequestParser};
use colored::Colorize;
use std::path::Path;
use tracing::debug;

use crate::input::read_input;

/// Run the sanity check, parse and compile a request, reporting the outcome
pub fn execute(
    config: &ArchivumConfig,
    input: &Path,
    kind: RequestKind,
    collection: Collection,
) -> Result<()> {
    let text = read_input(input)?;
    debug!(bytes = text.len(), %kind, %collection, "Checking request");

    let parser = RequestParser::new(config.limits);
    let compiler = MongoCompiler::new(config.ancestry.clone());

    let outcome = parser
        .parse_str(kind, &text)
        .and_then(|request| {
            compiler
                .compile_request(&request, collection)
                .map(|plan| (request, plan))
        });

    match outcome {
        Ok((request, plan)) => {
            println!(
                "{} {} request on {}: {} root(s), {} step(s), limit {}",
                "Valid:".green().bold(),
                kind,
                collection,
                request.roots().len(),
                plan.steps.len(),
                plan.limit
            );
            Ok(())
        }
        Err(err) => {
            eprintln!(
                "{} {} ({:?})",
                "Invalid:".red().bold(),
                err,
                err.category()
            );
            Err(err).context("Request rejected")
        }
    }
}
