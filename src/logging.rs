//! Structured logging setup, adapted from the teacher's `logging::init_with_config`.

use tracing_subscriber::{layer::Identity, prelude::*};

use crate::config::{LogFormat, LoggingConfig};

/// Initialize the global tracing subscriber. Level precedence: config
/// value, then `RUST_LOG`, then `info`.
pub fn init_with_config(cfg: &LoggingConfig) {
    let env_filter = if let Some(level) = &cfg.level {
        tracing_subscriber::EnvFilter::new(level.as_str())
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };

    let registry = tracing_subscriber::registry().with(env_filter);

    match cfg.format {
        LogFormat::Json => {
            let _ = registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_ansi(false)
                        .with_writer(std::io::stdout),
                )
                .with(Identity::new())
                .try_init();
        }
        LogFormat::Text => {
            let _ = registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(true)
                        .with_writer(std::io::stdout),
                )
                .with(Identity::new())
                .try_init();
        }
    }
}
