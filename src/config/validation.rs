//! Configuration validation.

use super::Config;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("require_auth is true but no auth_entries are configured")]
    AuthEnabledWithoutEntries,
    #[error("keepalive_payload_len must be nonzero")]
    ZeroKeepaliveLength,
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.require_auth && config.auth_entries.is_empty() {
        return Err(ConfigError::AuthEnabledWithoutEntries);
    }
    if config.keepalive_payload_len == 0 {
        return Err(ConfigError::ZeroKeepaliveLength);
    }
    Ok(())
}
