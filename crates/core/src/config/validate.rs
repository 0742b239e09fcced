use super::{
    types::{AuthMethod, Config},
    ConfigError,
};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Local auth has a non-zero session lifetime
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.auth.method == AuthMethod::Local && config.auth.session_ttl_hours == 0 {
        return Err(ConfigError::ValidationError(
            "auth.session_ttl_hours cannot be 0 with local auth".to_string(),
        ));
    }

    Ok(())
}
