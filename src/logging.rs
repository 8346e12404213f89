use crate::config::DEFAULT_LOG_FILTER;
use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global subscriber. Output goes to stderr: stdout belongs to
/// the IPC channel.
pub fn init_logging(filter: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))
}
