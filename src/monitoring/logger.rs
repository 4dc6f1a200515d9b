use std::str::FromStr;

use anyhow::{anyhow, Result};
use tracing::Level;

/// Parse a configured level name ("info", "DEBUG", ...)
pub fn parse_level(raw: &str) -> Result<Level> {
    Level::from_str(raw.trim()).map_err(|_| anyhow!("Unknown log level: {}", raw))
}

/// Install the global fmt subscriber. Logs go to stderr so the board on stdout stays clean.
pub fn init(level: &str) -> Result<()> {
    let level = parse_level(level)?;

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("info").unwrap(), Level::INFO);
        assert_eq!(parse_level(" WARN ").unwrap(), Level::WARN);
        assert!(parse_level("chatty").is_err());
    }
}
