//! Configuration schema definitions.
//!
//! ```toml
//! [core]
//! nick = "perch"
//! host = "irc.libera.chat"
//! port = 6667
//! prefix = "!"
//! cmds = ["JOIN #perch"]
//! plugins = ["*"]
//!
//! [logging]
//! level = "debug"
//!
//! # Any other table is a plugin section, read with `Bot::config`.
//! [karma]
//! self_penalty = true
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use perch_framework::{BotSettings, ConfigSections};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PerchConfig {
    /// Connection and identity settings.
    #[serde(default)]
    pub core: CoreConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Every other top-level table, keyed by name.
    #[serde(flatten)]
    pub sections: HashMap<String, Value>,
}

impl PerchConfig {
    /// Identity settings for the [`Bot`](perch_framework::Bot).
    pub fn bot_settings(&self) -> BotSettings {
        BotSettings {
            nick: self.core.nick.clone(),
            prefix: self.core.prefix.clone(),
        }
    }

    /// Plugin sections exposed through `Bot::config`.
    pub fn plugin_sections(&self) -> ConfigSections {
        self.sections.clone()
    }
}

// ─── Core ────────────────────────────────────────────────────────────────────

/// Connection and identity settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Requested nickname.
    #[serde(default = "default_nick")]
    pub nick: String,

    /// Username sent with `USER`.
    #[serde(default = "default_user")]
    pub user: String,

    /// Real name sent with `USER`.
    #[serde(default = "default_name")]
    pub name: String,

    /// Server host name.
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Server password, sent with `PASS` when set.
    #[serde(default)]
    pub password: Option<String>,

    /// Command trigger prefix.
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Raw lines sent once the server welcomes us.
    #[serde(default)]
    pub cmds: Vec<String>,

    /// Plugins to wire. Absent or containing `"*"` means every registered
    /// plugin.
    #[serde(default)]
    pub plugins: Option<Vec<String>>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            nick: default_nick(),
            user: default_user(),
            name: default_name(),
            host: default_host(),
            port: default_port(),
            password: None,
            prefix: default_prefix(),
            cmds: Vec::new(),
            plugins: None,
        }
    }
}

impl CoreConfig {
    /// `host:port`.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns `true` if every registered plugin should be wired.
    pub fn wants_all_plugins(&self) -> bool {
        self.plugins
            .as_ref()
            .is_none_or(|names| names.iter().any(|n| n == "*"))
    }
}

fn default_nick() -> String {
    "perch".to_string()
}

fn default_user() -> String {
    "perch".to_string()
}

fn default_name() -> String {
    "Perch Bot".to_string()
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    6667
}

fn default_prefix() -> String {
    "!".to_string()
}

// ─── Logging ─────────────────────────────────────────────────────────────────

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Global log level.
    #[serde(default)]
    pub level: LogLevel,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Output destination.
    #[serde(default)]
    pub output: LogOutput,

    /// Log file, for [`LogOutput::File`].
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Per-module levels, e.g. `perch_framework = "trace"`.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,

    /// Include thread ids.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include source file and line.
    #[serde(default)]
    pub file_location: bool,

    /// Span lifecycle events to log.
    #[serde(default)]
    pub span_events: SpanEventConfig,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            format: LogFormat::default(),
            output: LogOutput::default(),
            file_path: None,
            filters: HashMap::new(),
            thread_ids: false,
            file_location: false,
            span_events: SpanEventConfig::default(),
        }
    }
}

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
    /// Lowercase name, as used in filter directives.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// The matching [`tracing::Level`].
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

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature; falls back to compact otherwise.
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

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpanEventConfig {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub enter: bool,
    #[serde(default)]
    pub exit: bool,
    #[serde(default)]
    pub close: bool,
}
