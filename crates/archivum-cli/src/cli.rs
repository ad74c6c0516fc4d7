use archivum_query::{Collection, RequestKind};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;

/// Log level for CLI output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    Off,
    /// Error messages only
    Error,
    /// Warnings and errors
    Warn,
    /// Informational messages
    Info,
    /// Debug messages
    Debug,
    /// Trace-level messages (most verbose)
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Request kind accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Select,
    Insert,
    Update,
}

impl From<KindArg> for RequestKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Select => RequestKind::Select,
            KindArg::Insert => RequestKind::Insert,
            KindArg::Update => RequestKind::Update,
        }
    }
}

/// Target collection accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CollectionArg {
    Units,
    #[value(name = "objectgroups")]
    ObjectGroups,
}

impl From<CollectionArg> for Collection {
    fn from(collection: CollectionArg) -> Self {
        match collection {
            CollectionArg::Units => Collection::Units,
            CollectionArg::ObjectGroups => Collection::ObjectGroups,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    Toml,
    Json,
}

#[derive(Parser)]
#[command(name = "arq")]
#[command(about = "arq - check, parse and compile archival metadata requests")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Set log level (off, error, warn, info, debug, trace)
    /// If not specified, defaults to 'off'
    #[arg(short = 'l', long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Enable verbose logging (shortcut for --log-level=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (defaults to ~/.config/archivum/config.toml)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Maximum request size in bytes (overrides config file and environment)
    #[arg(long, global = true)]
    pub max_request_size: Option<usize>,
}

impl Cli {
    /// Effective log level: explicit level, then --verbose, then off
    pub fn level_filter(&self) -> LevelFilter {
        match (self.log_level, self.verbose) {
            (Some(level), _) => level.into(),
            (None, true) => LevelFilter::DEBUG,
            (None, false) => LevelFilter::OFF,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a request: sanity check, parse and compile
    Check {
        /// Request file, or '-' for stdin
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Request kind
        #[arg(short, long, value_enum, default_value = "select")]
        kind: KindArg,

        /// Target collection
        #[arg(short = 'c', long, value_enum, default_value = "units")]
        collection: CollectionArg,
    },

    /// Parse a request and print its syntax tree as JSON
    Parse {
        /// Request file, or '-' for stdin
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Request kind
        #[arg(short, long, value_enum, default_value = "select")]
        kind: KindArg,
    },

    /// Compile a request and print the resulting plan as JSON
    Compile {
        /// Request file, or '-' for stdin
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Request kind
        #[arg(short, long, value_enum, default_value = "select")]
        kind: KindArg,

        /// Target collection
        #[arg(short = 'c', long, value_enum, default_value = "units")]
        collection: CollectionArg,

        /// Replace the request roots with this id
        #[arg(long)]
        id: Option<String>,
    },

    /// Show the effective configuration
    Config {
        /// Output format
        #[arg(short = 'f', long, value_enum, default_value = "toml")]
        format: ConfigFormat,
    },
}
