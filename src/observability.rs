//! Logging setup
//!
//! Diagnostics go to stderr through `tracing`; stdout is reserved for the
//! per-scenario summary lines.

use std::env;
use tracing::level_filters::LevelFilter;
use tracing::Level;
use tracing_subscriber::{prelude::*, EnvFilter};

/// Install the global subscriber
///
/// `debug` raises the default level to DEBUG. A `RUST_LOG` holding a plain
/// level overrides the default; any other `RUST_LOG` value is used as a
/// filter directive as is.
pub fn initialize_tracing(debug: bool) {
    let (level, env_filter) = parse_rust_log(debug);
    let format = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(format.with_filter(LevelFilter::from(level)))
        .with(env_filter)
        .init();
}

pub fn parse_rust_log(debug: bool) -> (Level, EnvFilter) {
    let default = if debug { Level::DEBUG } else { Level::INFO };
    let level = match env::var(EnvFilter::DEFAULT_ENV) {
        Ok(value) => match value.parse::<Level>() {
            Ok(level) => level,
            Err(_) => return (Level::TRACE, EnvFilter::new(value)),
        },
        Err(_) => default,
    };

    // Maximum verbosity, narrowed down to `level` by the fmt layer
    let env_filter = EnvFilter::new("INFO,streambench=TRACE");

    (level, env_filter)
}
