use anyhow::Result;
use clap::Parser;
use tracing::debug;

use archivum_cli::{
    cli::{Cli, Commands},
    commands::{self, compile::CompileOptions},
    logging,
};
use archivum_config::ArchivumConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(cli.level_filter());

    // Precedence: defaults < config file < environment < command line
    let mut config = ArchivumConfig::load(cli.config.clone())?;
    if let Some(size) = cli.max_request_size {
        config.limits = config.limits.with_max_request_size(size);
    }
    config.validate()?;
    debug!(limits = ?config.limits, "Configuration loaded");

    match cli.command {
        Commands::Check {
            input,
            kind,
            collection,
        } => commands::check::execute(&config, &input, kind.into(), collection.into()),

        Commands::Parse { input, kind } => commands::parse::execute(&config, &input, kind.into()),

        Commands::Compile {
            input,
            kind,
            collection,
            id,
        } => commands::compile::execute(
            &config,
            &input,
            CompileOptions {
                kind: kind.into(),
                collection: collection.into(),
                id,
            },
        ),

        Commands::Config { format } => commands::config::execute(&config, format),
    }
}
