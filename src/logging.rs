// Logging setup
// RUST_LOG controls the filter; defaults to info

use anyhow::{anyhow, Context, Result};
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{fmt, EnvFilter};

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Log to stdout, for the web server
pub fn init_stdout() -> Result<()> {
    fmt()
        .with_env_filter(env_filter())
        .try_init()
        .map_err(|e| anyhow!("failed to install logger: {e}"))
}

/// Log to a file, for the terminal form where stdout is the screen
pub fn init_file(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;

    fmt()
        .with_env_filter(env_filter())
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|e| anyhow!("failed to install logger: {e}"))
}
