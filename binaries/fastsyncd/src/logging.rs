//! Tracing initialisation.

use anyhow::Context;
use tracing::level_filters::LevelFilter;

/// Install the global stdout subscriber at the configured level.
pub fn init(log_level: &str) -> anyhow::Result<()> {
    let level: LevelFilter = log_level
        .parse()
        .with_context(|| format!("unexpected log level: {log_level}"))?;

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    Ok(())
}
