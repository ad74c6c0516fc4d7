use anyhow::{Context, Result};
use archivum_config::ArchivumConfig;
use archivum_query::{RequestKind, RequestParser};
use std::path::Path;

use crate::input::read_input;

/// Parse a request and print its syntax tree
pub fn execute(config: &ArchivumConfig, input: &Path, kind: RequestKind) -> Result<()> {
    let text = read_input(input)?;
    let request = RequestParser::new(config.limits)
        .parse_str(kind, &text)
        .context("Failed to parse request")?;

    let output = serde_json::to_string_pretty(&request).context("Failed to serialize request")?;
    println!("{}", output);
    Ok(())
}
