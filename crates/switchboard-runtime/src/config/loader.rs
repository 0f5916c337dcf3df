//! Configuration loader using figment.
//!
//! # Feature Flags
//!
//! - `toml-config`: `switchboard.toml`, `config.toml`
//! - `yaml-config`: `switchboard.yaml`, `switchboard.yml`
//! - `json-config`: `switchboard.json`
//!
//! Every enabled format is searched; when several are found they are merged
//! in the order above.
//!
//! # Configuration Priority (lowest to highest)
//!
//! 1. Built-in defaults
//! 2. Programmatic merges ([`ConfigLoader::merge`])
//! 3. Profile-specific file (`switchboard.{profile}.toml`)
//! 4. Main file (`switchboard.toml`)
//! 5. Environment variables (`SWITCHBOARD_*`)
//!
//! # Environment Variable Mapping
//!
//! Keys use the `SWITCHBOARD_` prefix with `__` between sections:
//!
//! - `SWITCHBOARD_BOT__PREFIX=?` → `bot.prefix = "?"`
//! - `SWITCHBOARD_BOT__FUZZY=true` → `bot.fuzzy = true`
//! - `SWITCHBOARD_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//!
//! # Example
//!
//! ```rust,ignore
//! let config = ConfigLoader::new()
//!     .profile("production")
//!     .file("./deploy/switchboard.toml")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(feature = "json-config")]
use figment::providers::Json;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
#[cfg(any(feature = "toml-config", feature = "yaml-config", feature = "json-config"))]
use figment::providers::Format;
use figment::providers::{Env, Serialized};
use tracing::{debug, info, trace, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::SwitchboardConfig;
use super::validation::validate_config;

const ENV_PREFIX: &str = "SWITCHBOARD_";
const PROFILE_VAR: &str = "SWITCHBOARD_PROFILE";

/// Configuration profile for environment-specific settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Profile {
    #[default]
    Development,
    Production,
    Custom(String),
}

impl Profile {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "development" | "dev" => Self::Development,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Reads `SWITCHBOARD_PROFILE`, defaulting to development.
    pub fn from_env() -> Self {
        std::env::var(PROFILE_VAR)
            .map(|p| Self::parse(&p))
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Layered configuration loader.
pub struct ConfigLoader {
    figment: Figment,
    profile: Profile,
    search_paths: Vec<PathBuf>,
    load_env: bool,
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            figment: Figment::new(),
            profile: Profile::from_env(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.profile = Profile::parse(profile.as_ref());
        self
    }

    /// Adds a directory searched for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Loads exactly this file instead of searching.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges configuration programmatically, above the defaults and below
    /// files and the environment.
    pub fn merge(mut self, config: SwitchboardConfig) -> Self {
        self.figment = self.figment.merge(Serialized::defaults(config));
        self
    }

    /// Loads and validates the configuration.
    pub fn load(self) -> ConfigResult<SwitchboardConfig> {
        let profile = self.profile.clone();
        let config: SwitchboardConfig = self.build_figment()?.extract()?;
        validate_config(&config)?;

        debug!(
            profile = %profile,
            prefix = %config.bot.prefix,
            logging_level = %config.logging.level,
            "Configuration loaded"
        );
        Ok(config)
    }

    fn build_figment(mut self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(SwitchboardConfig::default()));
        figment = figment.merge(std::mem::take(&mut self.figment));

        if let Some(path) = &self.config_file {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.clone()));
            }
            info!(path = %path.display(), "Loading configuration file");
            figment = Self::merge_config_file(figment, path)?;
        } else {
            figment = self.load_config_files(figment);
        }

        if self.load_env {
            trace!("Loading environment variables with {ENV_PREFIX} prefix");
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        }

        Ok(figment)
    }

    /// Merges one file, dispatching on its extension.
    fn merge_config_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            #[cfg(feature = "toml-config")]
            "toml" => Ok(figment.merge(Toml::file(path))),
            #[cfg(feature = "yaml-config")]
            "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
            #[cfg(feature = "json-config")]
            "json" => Ok(figment.merge(Json::file(path))),
            _ => Err(ConfigError::UnsupportedFormat(ext.to_string())),
        }
    }

    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }

        let mut paths = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd);
        }
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("switchboard"));
        }
        paths
    }

    /// File names searched, in merge order.
    #[allow(unused_mut)]
    fn candidate_names() -> Vec<&'static str> {
        let mut names: Vec<&'static str> = Vec::new();
        #[cfg(feature = "toml-config")]
        names.extend(["switchboard.toml", "config.toml"]);
        #[cfg(feature = "yaml-config")]
        names.extend(["switchboard.yaml", "switchboard.yml"]);
        #[cfg(feature = "json-config")]
        names.push("switchboard.json");
        names
    }

    /// Searches every path for the first directory holding a base file and
    /// merges the profile variant and base file of each format found there.
    fn load_config_files(&self, mut figment: Figment) -> Figment {
        let names = Self::candidate_names();

        for dir in self.resolve_search_paths() {
            let mut found = false;
            for base_name in &names {
                let base_path = dir.join(base_name);
                if !base_path.exists() {
                    continue;
                }

                if let Some((stem, ext)) = base_name.rsplit_once('.') {
                    let profile_path = dir.join(format!("{stem}.{}.{ext}", self.profile));
                    if profile_path.exists() {
                        debug!(path = %profile_path.display(), "Loading profile-specific config");
                        figment = Self::merge_known(figment, &profile_path);
                    }
                }

                info!(path = %base_path.display(), "Loading configuration file");
                figment = Self::merge_known(figment, &base_path);
                found = true;
            }
            if found {
                return figment;
            }
        }

        warn!("No configuration file found, using defaults");
        figment
    }

    fn merge_known(figment: Figment, path: &Path) -> Figment {
        match Self::merge_config_file(figment.clone(), path) {
            Ok(merged) => merged,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping configuration file");
                figment
            }
        }
    }
}

/// Loads configuration from the default locations.
pub fn load_config() -> ConfigResult<SwitchboardConfig> {
    ConfigLoader::new().load()
}

/// Loads configuration from `path` plus the environment.
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<SwitchboardConfig> {
    ConfigLoader::new().file(path).load()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use figment::Jail;

    use super::*;
    use crate::config::{LogLevel, SimpleCommandConfig};

    fn load(loader: ConfigLoader) -> figment::Result<SwitchboardConfig> {
        loader.load().map_err(|e| figment::Error::from(e.to_string()))
    }

    #[test]
    fn test_default_config() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            let config = load(
                ConfigLoader::new()
                    .search_path(jail.directory())
                    .without_env(),
            )?;

            assert_eq!(config, SwitchboardConfig::default());
            assert_eq!(config.bot.prefix, "!");
            Ok(())
        });
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_toml_file_and_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "switchboard.toml",
                r#"
                [bot]
                prefix = "?"
                fuzzy = true

                [bot.options]
                ignore_bots = true

                [permissions]
                toxic = ["trusted"]

                [[simple_commands]]
                name = "rules"
                content = "Be nice."

                [[simple_commands]]
                name = "faq"
                content = "Read the pins."
                help_text = "Frequently asked questions"

                [errors]
                rate_limited = "Slow down!"
                "#,
            )?;
            jail.set_env("SWITCHBOARD_LOGGING__LEVEL", "debug");
            jail.set_env("SWITCHBOARD_BOT__ERROR_CHANNEL", "ops");

            let config = load(ConfigLoader::new().search_path(jail.directory()))?;

            assert_eq!(config.bot.prefix, "?");
            assert!(config.bot.fuzzy);
            assert!(config.bot.options.ignore_bots);
            assert_eq!(config.bot.error_channel.as_deref(), Some("ops"));
            assert_eq!(config.permissions["toxic"], vec!["trusted".to_string()]);
            assert_eq!(
                config.simple_commands,
                vec![
                    SimpleCommandConfig {
                        name: "rules".into(),
                        content: "Be nice.".into(),
                        help_text: None,
                    },
                    SimpleCommandConfig {
                        name: "faq".into(),
                        content: "Read the pins.".into(),
                        help_text: Some("Frequently asked questions".into()),
                    },
                ]
            );
            assert_eq!(config.errors.rate_limited, "Slow down!");
            assert_eq!(config.errors.command_not_found, "Command not found.");
            assert_eq!(config.logging.level, LogLevel::Debug);
            Ok(())
        });
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_profile_file_is_overridden_by_base() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file("switchboard.production.toml", "[bot]\nprefix = \"$\"\nfuzzy = true")?;
            jail.create_file("switchboard.toml", "[bot]\nprefix = \"!\"")?;

            let config = load(
                ConfigLoader::new()
                    .profile("prod")
                    .search_path(jail.directory())
                    .without_env(),
            )?;

            assert_eq!(config.bot.prefix, "!");
            assert!(config.bot.fuzzy);
            Ok(())
        });
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = ConfigLoader::new()
            .file("/definitely/not/here/switchboard.toml")
            .without_env()
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_invalid_env_value_fails_validation() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("SWITCHBOARD_BOT__REPLY_TIMEOUT_MS", "0");

            let err = ConfigLoader::new()
                .search_path(jail.directory())
                .load()
                .unwrap_err();
            assert!(matches!(err, ConfigError::ValidationError { .. }));
            Ok(())
        });
    }

    #[test]
    fn test_profile_parsing() {
        assert_eq!(Profile::parse("PROD"), Profile::Production);
        assert_eq!(Profile::parse("dev"), Profile::Development);
        assert_eq!(Profile::parse("staging"), Profile::Custom("staging".into()));
    }
}
