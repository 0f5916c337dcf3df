//! Configuration validation utilities.

use std::collections::HashSet;

use super::error::{ConfigError, ConfigResult};
use super::schema::{BotConfig, LogOutput, LoggingConfig, SimpleCommandConfig, SwitchboardConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &SwitchboardConfig) -> ConfigResult<()> {
    validate_bot_config(&config.bot)?;
    validate_permissions(config)?;
    validate_simple_commands(&config.simple_commands)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

fn validate_bot_config(bot: &BotConfig) -> ConfigResult<()> {
    if bot.prefix.is_empty() {
        return Err(ConfigError::missing_field("bot.prefix"));
    }

    if bot.prefix.chars().any(char::is_whitespace) {
        return Err(ConfigError::validation(
            "Command prefix cannot contain whitespace",
        ));
    }

    if bot.reply_timeout_ms == 0 {
        return Err(ConfigError::validation(
            "Reply timeout must be greater than 0",
        ));
    }

    if let Some(channel) = &bot.error_channel
        && channel.trim().is_empty()
    {
        return Err(ConfigError::validation("Error channel cannot be blank"));
    }

    Ok(())
}

fn validate_permissions(config: &SwitchboardConfig) -> ConfigResult<()> {
    for (command, roles) in &config.permissions {
        if command.trim().is_empty() {
            return Err(ConfigError::validation(
                "Permission entry has an empty command name",
            ));
        }
        if roles.iter().any(|role| role.trim().is_empty()) {
            return Err(ConfigError::validation(format!(
                "Permission entry for '{command}' contains a blank role"
            )));
        }
    }
    Ok(())
}

fn validate_simple_commands(commands: &[SimpleCommandConfig]) -> ConfigResult<()> {
    let mut seen = HashSet::new();

    for command in commands {
        if command.name.trim().is_empty() {
            return Err(ConfigError::missing_field("simple_commands.name"));
        }

        if command.name.chars().any(char::is_whitespace) {
            return Err(ConfigError::validation(format!(
                "Simple command name '{}' cannot contain whitespace",
                command.name
            )));
        }

        if !seen.insert(command.name.as_str()) {
            return Err(ConfigError::validation(format!(
                "Duplicate simple command: {}",
                command.name
            )));
        }
    }

    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple(name: &str) -> SimpleCommandConfig {
        SimpleCommandConfig {
            name: name.to_string(),
            content: "text".to_string(),
            help_text: None,
        }
    }

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&SwitchboardConfig::default()).is_ok());
    }

    #[test]
    fn test_validate_prefix() {
        let mut config = SwitchboardConfig::default();
        config.bot.prefix = String::new();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingField { .. })
        ));

        config.bot.prefix = "! ".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = SwitchboardConfig::default();
        config.bot.reply_timeout_ms = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_blank_error_channel() {
        let mut config = SwitchboardConfig::default();
        config.bot.error_channel = Some("  ".to_string());
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_blank_role() {
        let mut config = SwitchboardConfig::default();
        config
            .permissions
            .insert("toxic".to_string(), vec!["trusted".to_string(), " ".to_string()]);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_simple_commands() {
        let mut config = SwitchboardConfig::default();
        config.simple_commands = vec![simple("rules"), simple("")];
        assert!(validate_config(&config).is_err());

        config.simple_commands = vec![simple("rules"), simple("rules")];
        assert!(validate_config(&config).is_err());

        config.simple_commands = vec![simple("rules"), simple("faq")];
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_file_output_requires_path() {
        let mut config = SwitchboardConfig::default();
        config.logging.output = LogOutput::File;
        assert!(validate_config(&config).is_err());

        config.logging.file_path = Some("switchboard.log".into());
        assert!(validate_config(&config).is_ok());
    }
}
