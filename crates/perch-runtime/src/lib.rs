//! Perch Runtime - connection and orchestration layer for the Perch bot.
//!
//! This crate provides:
//! - Configuration loading (`PerchConfig`, `ConfigLoader`)
//! - Logging setup driven by the `[logging]` table
//! - The line transport and session housekeeping (PING, nick tracking)
//! - Runtime orchestration (`PerchRuntime`)
//!
//! ```ignore
//! use perch_runtime::PerchRuntime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = PerchRuntime::builder().build()?;
//!
//!     runtime.register("greeter", |basic: Arc<BasicMux>| {
//!         basic.subscribe("JOIN", |bot, event| Ok(bot.reply(event, "hello")?));
//!         Ok::<_, Infallible>(())
//!     })?;
//!
//!     // Run until the server hangs up or Ctrl+C
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! Plugins are wired once, before the first line is read. Events are
//! dispatched one at a time, in arrival order.

pub mod config;
pub mod connection;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod session;

// Re-exports
pub use config::{
    ConfigError, ConfigLoader, ConfigResult, CoreConfig, LoggingConfig, PerchConfig, Profile,
    load_config, load_config_from_file,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{PerchRuntime, RuntimeBuilder};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// This provides all the commonly used logging macros:
/// - `trace!`, `debug!`, `info!`, `warn!`, `error!`
/// - `span`, `event`
/// - `instrument` attribute
/// - `Level` for span creation
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
