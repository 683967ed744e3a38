//! Logging setup

use tracing_subscriber::{EnvFilter, fmt};

use crate::error::{ClientError, ClientResult};

/// Initialize console logging.
///
/// `RUST_LOG` overrides `level` when set.
///
/// # Examples
/// ```no_run
/// bizdesk_client::logger::init_logger("debug").ok();
/// ```
pub fn init_logger(level: &str) -> ClientResult<()> {
    fmt()
        .with_env_filter(filter(level))
        .with_target(true)
        .try_init()
        .map_err(|e| ClientError::Config(format!("logger: {}", e)))
}

/// Initialize JSON logging
pub fn init_json_logger(level: &str) -> ClientResult<()> {
    fmt()
        .json()
        .with_env_filter(filter(level))
        .with_current_span(true)
        .with_file(true)
        .with_line_number(true)
        .try_init()
        .map_err(|e| ClientError::Config(format!("logger: {}", e)))
}

fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
    })
}
