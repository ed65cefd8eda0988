//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{LogOutput, LoggingConfig, RoutingConfig, WaypointConfig};

/// Longest slow-turn threshold accepted: one hour.
const MAX_SLOW_TURN_WARN_MS: u64 = 60 * 60 * 1000;

/// Validates the entire configuration.
pub fn validate_config(config: &WaypointConfig) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;
    validate_routing_config(&config.routing)?;
    Ok(())
}

/// Validates logging configuration.
fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }

    for module in logging.filters.keys() {
        if module.is_empty() {
            return Err(ConfigError::validation("Log filter module name is empty"));
        }
        if module.contains(['=', ',']) || module.chars().any(char::is_whitespace) {
            return Err(ConfigError::validation(format!(
                "Invalid log filter module name: {module:?}"
            )));
        }
    }

    Ok(())
}

/// Validates routing configuration.
fn validate_routing_config(routing: &RoutingConfig) -> ConfigResult<()> {
    if routing.slow_turn_warn_ms > MAX_SLOW_TURN_WARN_MS {
        return Err(ConfigError::validation(format!(
            "Slow turn threshold must be at most {MAX_SLOW_TURN_WARN_MS} ms, got {}",
            routing.slow_turn_warn_ms
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::LogLevel;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&WaypointConfig::default()).is_ok());
    }

    #[test]
    fn test_file_output_requires_path() {
        let mut config = WaypointConfig::default();
        config.logging.output = LogOutput::File;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingField { .. })
        ));

        config.logging.file_path = Some("waypoint.log".into());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_filter_module_names() {
        let mut config = WaypointConfig::default();
        config
            .logging
            .filters
            .insert("waypoint_framework".to_string(), LogLevel::Trace);
        assert!(validate_config(&config).is_ok());

        config
            .logging
            .filters
            .insert("bad=name".to_string(), LogLevel::Debug);
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_slow_turn_threshold_bound() {
        let mut config = WaypointConfig::default();
        config.routing.slow_turn_warn_ms = MAX_SLOW_TURN_WARN_MS + 1;
        assert!(validate_config(&config).is_err());
    }
}
