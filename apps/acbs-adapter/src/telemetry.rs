//! Tracing Setup
//!
//! Installs a `tracing-subscriber` fmt subscriber.
//!
//! # Configuration
//!
//! - `RUST_LOG`: filter directives; take precedence over the configured level
//! - `observability.logging.level`: fallback filter (default: `info`)
//! - `observability.logging.format`: `pretty` or `compact` (default: `compact`)

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Initialize the global tracing subscriber.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_tracing(logging: &LoggingConfig) -> bool {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true);

    let result = if logging.format.eq_ignore_ascii_case("pretty") {
        builder.pretty().try_init()
    } else {
        builder.compact().try_init()
    };

    result.is_ok()
}
