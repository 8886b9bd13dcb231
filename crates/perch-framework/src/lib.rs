//! # Perch Framework
//!
//! The plugin host and event router of the Perch bot.
//!
//! This layer provides:
//! - [`PluginRegistry`]: typed, dependency-resolving singleton wiring
//! - [`Bot`]: the façade plugins use to reply, read configuration and reach
//!   other plugins
//! - [`BasicMux`], [`CommandMux`] and [`MentionMux`]: layered, synchronous,
//!   failure-isolated dispatch
//!
//! It knows nothing about sockets; the runtime crate owns the connection and
//! feeds parsed events into the [`BasicMux`].

pub mod bot;
pub mod error;
pub mod handler;
pub mod mux;
pub mod plugin;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use bot::{Bot, BotSettings, ConfigSections};
pub use error::{BotError, BotResult, BoxError, PluginError, RegistrationError};
pub use handler::{BoxedHandler, HandlerResult};
pub use mux::{BasicMux, CommandMux, HelpInfo, MentionMux, Visibility};
pub use plugin::PluginRegistry;
