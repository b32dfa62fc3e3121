//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{ClientConfig, LogOutput, LoggingConfig, ParlorConfig};

/// Validates the entire configuration.
///
/// Unknown log levels never get this far: they are rejected when the
/// configuration is extracted.
pub fn validate_config(config: &ParlorConfig) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;
    validate_client_config(&config.client)?;
    Ok(())
}

/// Validates logging settings.
fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File {
        match &logging.file_path {
            None => {
                return Err(ConfigError::validation(
                    "logging.file_path is required when logging.output is 'file'",
                ));
            }
            Some(path) if path.file_name().is_none() => {
                return Err(ConfigError::validation(format!(
                    "logging.file_path must name a file: {}",
                    path.display()
                )));
            }
            Some(_) => {}
        }
    }

    if logging.max_files == 0 {
        return Err(ConfigError::validation(
            "logging.max_files must be greater than 0",
        ));
    }

    if let Some(module) = logging
        .filters
        .keys()
        .find(|module| module.is_empty() || module.contains(char::is_whitespace))
    {
        return Err(ConfigError::validation(format!(
            "Invalid module name in logging.filters: {module:?}"
        )));
    }

    Ok(())
}

/// Validates client session settings.
fn validate_client_config(client: &ClientConfig) -> ConfigResult<()> {
    if client.member_concurrency == 0 {
        return Err(ConfigError::validation(
            "client.member_concurrency must be greater than 0",
        ));
    }
    Ok(())
}
