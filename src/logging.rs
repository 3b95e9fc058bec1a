//! Log subscriber setup.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::ConfigError;
use crate::error::{BenchError, Result};

/// Installs the global subscriber, writing to stderr so benchmark output on
/// stdout stays machine-readable. `level` is an `EnvFilter` directive such as
/// `warn` or `hopbench=debug`.
pub fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level).map_err(|_| ConfigError::InvalidValue {
        key: "log-level".into(),
        value: level.into(),
        expected: "log filter directive",
    })?;
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|_| BenchError::Command("logging already initialized".into()))
}
