//! Configuration schema definitions.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use switchboard_framework::{
    ErrorTexts, MuxBuilder, MuxResult, Options, PermissionTable, SimpleCommand,
};
use tracing::debug;

/// Help text given to canned replies that do not declare their own.
pub const SIMPLE_COMMAND_HELP: &str = "This is a simple command";

/// Root configuration structure.
///
/// ```toml
/// [bot]
/// prefix = "!"
/// fuzzy = true
/// error_channel = "bot-errors"
///
/// [bot.options]
/// ignore_bots = true
///
/// [permissions]
/// toxic = ["trusted", "moderator"]
///
/// [[simple_commands]]
/// name = "rules"
/// content = "Be nice."
///
/// [errors]
/// rate_limited = "Slow down!"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchboardConfig {
    #[serde(default)]
    pub bot: BotConfig,

    /// Command name to the roles allowed to run it.
    #[serde(default)]
    pub permissions: BTreeMap<String, Vec<String>>,

    /// Canned replies, registered in the listed order.
    #[serde(default)]
    pub simple_commands: Vec<SimpleCommandConfig>,

    /// User-facing rejection messages.
    #[serde(default)]
    pub errors: ErrorTexts,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Interval of the expired rate-limit entry sweep; zero disables it.
    #[serde(default = "default_sweep_secs")]
    pub rate_limit_sweep_secs: u64,
}

impl Default for SwitchboardConfig {
    fn default() -> Self {
        Self {
            bot: BotConfig::default(),
            permissions: BTreeMap::new(),
            simple_commands: Vec::new(),
            errors: ErrorTexts::default(),
            logging: LoggingConfig::default(),
            rate_limit_sweep_secs: default_sweep_secs(),
        }
    }
}

fn default_sweep_secs() -> u64 {
    60
}

impl SwitchboardConfig {
    /// Creates a [`MuxBuilder`] with the configured prefix and policy applied.
    pub fn mux_builder(&self) -> MuxResult<MuxBuilder> {
        let mut builder = MuxBuilder::new(self.bot.prefix.as_str())?;
        self.apply(&mut builder)?;
        Ok(builder)
    }

    /// Applies permissions, error texts, eligibility options, fuzzy matching
    /// and canned replies to `builder`.
    pub fn apply(&self, builder: &mut MuxBuilder) -> MuxResult<()> {
        builder
            .set_permissions(self.permission_table())
            .set_errors(self.errors.clone())
            .set_options(self.bot.options);

        if self.bot.fuzzy {
            builder.use_fuzzy();
        }

        for simple in &self.simple_commands {
            builder.register_simple(simple.to_command())?;
        }

        debug!(
            permissions = self.permissions.len(),
            simple_commands = self.simple_commands.len(),
            fuzzy = self.bot.fuzzy,
            "Applied configuration to multiplexer"
        );
        Ok(())
    }

    pub fn permission_table(&self) -> PermissionTable {
        self.permissions
            .iter()
            .map(|(command, roles)| (command.as_str(), roles.clone()))
            .collect()
    }

    /// Interval of the rate-limit sweep, or `None` when disabled.
    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.rate_limit_sweep_secs > 0).then(|| Duration::from_secs(self.rate_limit_sweep_secs))
    }
}

/// Dispatcher settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotConfig {
    /// Literal every command must start with.
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Resolve near-miss command names.
    #[serde(default)]
    pub fuzzy: bool,

    #[serde(default)]
    pub options: Options,

    /// Channel receiving handler error reports.
    #[serde(default)]
    pub error_channel: Option<String>,

    /// Upper bound for every outbound transport call, in milliseconds.
    #[serde(default = "default_reply_timeout_ms")]
    pub reply_timeout_ms: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            fuzzy: false,
            options: Options::default(),
            error_channel: None,
            reply_timeout_ms: default_reply_timeout_ms(),
        }
    }
}

impl BotConfig {
    pub fn reply_timeout(&self) -> Duration {
        Duration::from_millis(self.reply_timeout_ms)
    }
}

fn default_prefix() -> String {
    "!".to_string()
}

fn default_reply_timeout_ms() -> u64 {
    10_000
}

/// A canned reply declared in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleCommandConfig {
    pub name: String,
    pub content: String,
    #[serde(default)]
    pub help_text: Option<String>,
}

impl SimpleCommandConfig {
    pub fn to_command(&self) -> SimpleCommand {
        SimpleCommand::new(
            self.name.as_str(),
            self.content.as_str(),
            self.help_text.as_deref().unwrap_or(SIMPLE_COMMAND_HELP),
        )
    }
}

// =============================================================================
// Logging
// =============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    #[cfg(feature = "json-log")]
    Json,
}

/// Log destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// Rotation policy of the log file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Never,
    Hourly,
    Daily,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpanEventConfig {
    pub new: bool,
    pub enter: bool,
    pub exit: bool,
    pub close: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    pub output: LogOutput,
    pub span_events: SpanEventConfig,
    pub thread_ids: bool,
    /// Include source file and line.
    pub file_location: bool,
    /// Required when `output` is `file`.
    pub file_path: Option<PathBuf>,
    pub rotation: LogRotation,
    /// Per-module level overrides, e.g. `switchboard_framework = "debug"`.
    pub filters: HashMap<String, LogLevel>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
            output: LogOutput::Stdout,
            span_events: SpanEventConfig::default(),
            thread_ids: false,
            file_location: false,
            file_path: None,
            rotation: LogRotation::Never,
            filters: HashMap::new(),
        }
    }
}
