//! Request input: a file path, or `-` for stdin.

use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;

/// Read the whole request text
pub fn read_input(input: &Path) -> Result<String> {
    if input == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read request from stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read request file: {}", input.display()))
}
