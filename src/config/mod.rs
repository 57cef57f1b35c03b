//! Configuration module.
//!
//! Layered precedence, narrowed from the teacher's multi-source loader
//! to what a single-process in-memory signaling server needs:
//!
//! 1. `RIFT_SIGNAL_CONFIG_JSON` env var (raw JSON document)
//! 2. `RIFT_SIGNAL_CONFIG_PATH` env var (path to a JSON file)
//! 3. `config.json` in the current working directory
//! 4. Compiled-in defaults
//! 5. `RIFT_SIGNAL__*` environment overrides (`__` nested separator), applied last

pub mod defaults;
pub mod loader;
pub mod logging;
pub mod types;
pub mod validation;

pub use loader::load;
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use types::{AuthEntry, Config};
pub use validation::validate_config;
