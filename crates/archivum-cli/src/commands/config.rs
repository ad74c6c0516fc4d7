use anyhow::Result;
use archivum_config::ArchivumConfig;

use crate::cli::ConfigFormat;

/// Print the effective configuration
pub fn execute(config: &ArchivumConfig, format: ConfigFormat) -> Result<()> {
    let output = match format {
        ConfigFormat::Toml => config.display_as_toml()?,
        ConfigFormat::Json => config.display_as_json()?,
    };
    println!("{}", output);
    Ok(())
}
