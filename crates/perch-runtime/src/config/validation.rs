//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{CoreConfig, LogOutput, LoggingConfig, PerchConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &PerchConfig) -> ConfigResult<()> {
    validate_core_config(&config.core)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

/// Validates connection and identity settings.
fn validate_core_config(core: &CoreConfig) -> ConfigResult<()> {
    for (field, value) in [
        ("core.nick", &core.nick),
        ("core.user", &core.user),
        ("core.host", &core.host),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::missing_field(field));
        }
    }

    if core.nick.contains(char::is_whitespace) {
        return Err(ConfigError::validation("Nick cannot contain whitespace"));
    }

    if core.port == 0 {
        return Err(ConfigError::InvalidPort(core.port));
    }

    if core.prefix.is_empty() {
        return Err(ConfigError::missing_field("core.prefix"));
    }
    if core.prefix.contains(char::is_whitespace) {
        return Err(ConfigError::validation(
            "Command prefix cannot contain whitespace",
        ));
    }

    if let Some(line) = core.cmds.iter().find(|c| c.contains(['\r', '\n'])) {
        return Err(ConfigError::validation(format!(
            "Startup command must be a single line: {line:?}"
        )));
    }

    Ok(())
}

/// Validates logging settings.
fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }

    if logging.filters.keys().any(|module| module.trim().is_empty()) {
        return Err(ConfigError::validation("Log filter module cannot be empty"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        let config = PerchConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_missing_host() {
        let mut config = PerchConfig::default();
        config.core.host = " ".to_string();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingField { field }) if field == "core.host"
        ));
    }

    #[test]
    fn test_validate_port() {
        let mut config = PerchConfig::default();
        config.core.port = 0;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidPort(0))
        ));
    }

    #[test]
    fn test_validate_prefix() {
        let mut config = PerchConfig::default();
        config.core.prefix = String::new();
        assert!(validate_config(&config).is_err());
        config.core.prefix = "! ".to_string();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_validate_multiline_cmd() {
        let mut config = PerchConfig::default();
        config.core.cmds = vec!["JOIN #a\r\nQUIT".to_string()];
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_file_output_needs_path() {
        let mut config = PerchConfig::default();
        config.logging.output = LogOutput::File;
        assert!(validate_config(&config).is_err());
        config.logging.file_path = Some("perch.log".into());
        assert!(validate_config(&config).is_ok());
    }
}
