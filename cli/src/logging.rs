use tracing_subscriber::EnvFilter;

use crate::{Error, Result};

/// Log to stderr so stdout carries only the screen. Quiet unless `RUST_LOG`
/// says otherwise.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error")))
        .try_init()
        .map_err(|e| Error::Custom(format!("logging: {e}")))
}
