//! # Perch
//!
//! A small, plugin-driven IRC bot host.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐  line   ┌──────────┐  PRIVMSG  ┌────────────┐
//! │   Runtime   │────────▶│ BasicMux │──────────▶│ CommandMux │──▶ command handlers
//! │ (connection)│         │  (verb)  │──────────▶│ MentionMux │──▶ mention handlers
//! └─────────────┘         └──────────┘           └────────────┘
//!        ▲                     │ other verbs
//!        │ outbound queue      ▼
//!        └──────────────── plugin handlers ◀── Bot façade
//! ```
//!
//! - **Runtime**: loads configuration, owns the connection, wires plugins
//! - **PluginRegistry**: builds each plugin once, after its dependencies
//! - **Bot**: the façade plugins use to reply and reach other plugins
//! - **Muxes**: synchronous routers; a failing handler never stops the others
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use perch::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = PerchRuntime::builder().build()?;
//!
//!     runtime.register("echo", |cmds: Arc<CommandMux>| {
//!         cmds.private("echo", |bot, event| Ok(bot.reply(event, event.trailing())?), None)
//!     })?;
//!
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: read `perch.toml` (default)
//! - `yaml-config`: read `perch.yaml`
//! - `json-log`: JSON log output
//! - `testing`: connection-free test helpers

pub use perch_core as core;
pub use perch_framework as framework;
pub use perch_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use perch::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use perch_runtime::{PerchConfig, PerchRuntime};

    // Plugin system
    pub use perch_framework::plugin::builtin::{BASIC_MUX, BOT, COMMAND_MUX, MENTION_MUX};
    pub use perch_framework::{PluginError, PluginRegistry, RegistrationError};

    // Event routing
    pub use perch_framework::{
        BasicMux, Bot, BotError, CommandMux, HandlerResult, HelpInfo, MentionMux, Visibility,
    };

    // Protocol envelope
    pub use perch_core::{Event, Prefix, verb};

    pub use std::convert::Infallible;
    pub use std::sync::Arc;
}
