//! Error types for the Perch framework.
//!
//! Errors fall into three groups:
//!
//! - [`PluginError`] — wiring failures raised while the plugin graph is being
//!   built. These are fatal to startup.
//! - [`RegistrationError`] — a plugin tried to register a command the mux
//!   refuses. Returned from the registering call so the plugin factory can
//!   propagate it with `?`.
//! - [`BotError`] — failures surfaced by the [`Bot`](crate::Bot) façade at
//!   runtime (closed connection, missing configuration section, …).
//!
//! Handler failures are plain [`anyhow::Error`]s and never escape dispatch.

use thiserror::Error;

/// Boxed error used for plugin factory failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while registering or resolving plugins.
#[derive(Debug, Error)]
pub enum PluginError {
    /// A plugin with this name is already registered.
    #[error("plugin '{name}' is already registered")]
    DuplicateName {
        /// The duplicated name.
        name: String,
    },

    /// The factory's declared shape cannot be wired.
    #[error("plugin '{plugin}' has an invalid factory: {reason}")]
    InvalidFactory {
        /// Plugin being registered.
        plugin: String,
        /// What is wrong with the factory.
        reason: String,
    },

    /// A declared dependency has no registered provider.
    #[error(
        "plugin '{plugin}' depends on `{dependency}`, which no registered plugin provides (chain: {})",
        .chain.join(" -> ")
    )]
    UnresolvedDependency {
        /// Plugin that declared the dependency.
        plugin: String,
        /// Type name of the missing dependency.
        dependency: &'static str,
        /// Resolution chain at the point of failure.
        chain: Vec<String>,
    },

    /// The dependency graph contains a cycle.
    #[error("dependency cycle detected: {}", .chain.join(" -> "))]
    CyclicDependency {
        /// The cycle, starting and ending with the same plugin.
        chain: Vec<String>,
    },

    /// No plugin with this name is registered.
    #[error("no plugin named '{name}' is registered")]
    UnknownPlugin {
        /// The requested name.
        name: String,
    },

    /// No registered plugin provides the requested type.
    #[error("no registered plugin provides `{dependency}`")]
    UnknownProvider {
        /// Type name of the requested instance.
        dependency: &'static str,
    },

    /// A resolved instance did not have the type its provider declared.
    #[error("plugin '{plugin}' did not produce a `{expected}`")]
    TypeMismatch {
        /// The provider plugin.
        plugin: String,
        /// The type the caller asked for.
        expected: &'static str,
    },

    /// The plugin factory itself returned an error.
    #[error("plugin '{plugin}' failed to initialise (chain: {}): {source}", .chain.join(" -> "))]
    Factory {
        /// The failing plugin.
        plugin: String,
        /// Resolution chain at the point of failure.
        chain: Vec<String>,
        /// The factory's error.
        #[source]
        source: BoxError,
    },

    /// The registry backing a [`Bot`](crate::Bot) has been dropped.
    #[error("plugin registry is no longer available")]
    RegistryClosed,
}

impl PluginError {
    /// Creates an invalid-factory error.
    pub fn invalid_factory(plugin: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFactory {
            plugin: plugin.into(),
            reason: reason.into(),
        }
    }

    /// Returns the resolution chain carried by this error, if any.
    pub fn chain(&self) -> &[String] {
        match self {
            Self::UnresolvedDependency { chain, .. }
            | Self::CyclicDependency { chain }
            | Self::Factory { chain, .. } => chain,
            _ => &[],
        }
    }
}

/// Errors raised while registering a command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// The trigger is already registered on this mux.
    #[error("command '{trigger}' is already registered")]
    DuplicateTrigger {
        /// The duplicated trigger.
        trigger: String,
    },

    /// The trigger cannot be matched.
    #[error("invalid command trigger {trigger:?}: {reason}")]
    InvalidTrigger {
        /// The offending trigger.
        trigger: String,
        /// Why it was refused.
        reason: &'static str,
    },
}

/// Errors surfaced by the bot façade.
#[derive(Debug, Error)]
pub enum BotError {
    /// The outbound half of the connection has shut down.
    #[error("connection is closed")]
    ConnectionClosed,

    /// The event has neither a channel target nor a sender to reply to.
    #[error("cannot determine a reply target for {command} event")]
    NoReplyTarget {
        /// Verb of the event being replied to.
        command: String,
    },

    /// The requested configuration section does not exist.
    #[error("configuration section '{section}' is missing")]
    MissingSection {
        /// Section name.
        section: String,
    },

    /// The configuration section did not match the requested shape.
    #[error("configuration section '{section}' is malformed: {source}")]
    InvalidSection {
        /// Section name.
        section: String,
        /// Deserialisation failure.
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for bot façade operations.
pub type BotResult<T> = Result<T, BotError>;
