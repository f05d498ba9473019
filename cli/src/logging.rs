use anyhow::{anyhow, Result};
use colored::*;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Maps a configured level name to a tracing level, defaulting to WARN
pub fn parse_level(level: Option<&str>, verbose: bool) -> Level {
    if verbose {
        return Level::DEBUG;
    }
    match level.map(|l| l.to_lowercase()).as_deref() {
        Some("trace") => Level::TRACE,
        Some("debug") => Level::DEBUG,
        Some("info") => Level::INFO,
        Some("error") => Level::ERROR,
        _ => Level::WARN,
    }
}

/// Installs the global subscriber; logs go to stderr so replies stay clean on stdout
pub fn init_logging(level: Option<&str>, verbose: bool) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(parse_level(level, verbose))
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow!("Failed to set tracing subscriber: {}", e))
}

pub fn log_error(message: &str) {
    eprintln!("{} {}", "[ERROR]".red().bold(), message);
}
