//! Subscriber setup for the binary.

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Crates whose events are shown
const TARGETS: [&str; 4] = ["arq", "archivum_cli", "archivum_config", "archivum_query"];

/// Filter directive for `level` over our own crates
pub fn filter_directive(level: LevelFilter) -> String {
    TARGETS
        .iter()
        .map(|target| format!("{}={}", target, level.to_string().to_lowercase()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Install the global subscriber, writing to stderr
pub fn init(level: LevelFilter) {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter_directive(level)))
        .with_writer(std::io::stderr)
        .init();
}
