//! Main runtime orchestration.
//!
//! The runtime owns the plugin registry and the connection. It wires the
//! plugin graph at startup, then runs a single sequential intake loop: each
//! line is parsed and dispatched through the [`BasicMux`] before the next
//! line is read.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use perch_runtime::PerchRuntime;
//!
//! let runtime = PerchRuntime::builder()
//!     .config_file("perch.toml")
//!     .build()?;
//!
//! runtime.register("echo", |cmds: Arc<CommandMux>| {
//!     cmds.private("echo", |bot, event| Ok(bot.reply(event, event.trailing())?), None)?;
//!     anyhow::Ok(())
//! })?;
//!
//! runtime.run().await?;
//! ```

use std::convert::Infallible;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use futures::{Stream, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::signal;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio_util::codec::LinesCodecError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::config::{ConfigLoader, ConfigResult, PerchConfig, validate_config};
use crate::connection;
use crate::error::RuntimeResult;
use crate::logging;
use crate::session::{self, SESSION};
use perch_core::Event;
use perch_framework::error::BoxError;
use perch_framework::plugin::builtin::{self, BUILTIN_ORDER};
use perch_framework::plugin::Dependencies;
use perch_framework::{BasicMux, Bot, PluginRegistry};

/// The Perch runtime: one connection, one plugin graph.
pub struct PerchRuntime {
    config: PerchConfig,
    registry: Arc<PluginRegistry>,
    bot: Arc<Bot>,
    outbound: UnboundedReceiver<String>,
}

impl PerchRuntime {
    /// Creates a runtime builder for custom configuration.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from configuration.
    ///
    /// This validates the configuration, initializes logging, installs the
    /// [`Bot`] and registers the built-in muxes and session handlers.
    pub fn from_config(config: PerchConfig) -> RuntimeResult<Self> {
        validate_config(&config)?;
        logging::init_from_config(&config.logging);

        let registry = Arc::new(PluginRegistry::new());
        let (tx, outbound) = mpsc::unbounded_channel();
        let bot = Bot::install(
            config.bot_settings(),
            config.plugin_sections(),
            tx,
            &registry,
        )?;

        builtin::register_builtins(&registry)?;
        let cmds = config.core.cmds.clone();
        registry.register(SESSION, move |basic: Arc<BasicMux>| {
            session::install(&basic, cmds.clone());
            Ok::<_, Infallible>(())
        })?;

        info!(
            nick = %config.core.nick,
            server = %config.core.address(),
            log_level = %config.logging.level,
            "Runtime initialized from configuration"
        );

        Ok(Self {
            config,
            registry,
            bot,
            outbound,
        })
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &PerchConfig {
        &self.config
    }

    /// The plugin registry.
    pub fn registry(&self) -> &Arc<PluginRegistry> {
        &self.registry
    }

    /// The bot façade.
    pub fn bot(&self) -> &Arc<Bot> {
        &self.bot
    }

    /// Registers a plugin factory. See [`PluginRegistry::register`].
    pub fn register<D, T, E, F>(&self, name: impl Into<String>, factory: F) -> RuntimeResult<()>
    where
        D: Dependencies,
        T: Send + Sync + 'static,
        E: Into<BoxError>,
        F: Fn(D) -> Result<T, E> + Send + Sync + 'static,
    {
        self.registry.register(name, factory)?;
        Ok(())
    }

    /// Resolves the plugin graph.
    ///
    /// The built-in muxes are wired first (command mux before mention mux),
    /// then the session handlers, then every plugin enabled by
    /// `core.plugins`. Any failure is fatal.
    pub fn wire(&self) -> RuntimeResult<()> {
        self.registry.resolve_each(BUILTIN_ORDER)?;
        self.registry.resolve(SESSION)?;

        let enabled: Vec<String> = if self.config.core.wants_all_plugins() {
            self.registry.names()
        } else {
            self.config.core.plugins.clone().unwrap_or_default()
        };

        for name in self.registry.names() {
            if !builtin::is_builtin(&name) && name != SESSION && !enabled.contains(&name) {
                debug!(plugin = %name, "Plugin registered but not enabled");
            }
        }

        let mut wired = 0;
        for name in &enabled {
            if builtin::is_builtin(name) || name == SESSION {
                continue;
            }
            self.registry.resolve(name)?;
            wired += 1;
        }

        info!(plugins = wired, "Plugins wired");
        Ok(())
    }

    /// Connects to the configured server and runs until the connection
    /// closes or a shutdown signal is received.
    pub async fn run(self) -> RuntimeResult<()> {
        let stream = connection::connect(&self.config.core).await?;
        self.run_on(stream, shutdown_signal()).await
    }

    /// Runs over an already established connection until it closes or
    /// `shutdown` completes.
    pub async fn run_on<T, F>(self, io: T, shutdown: F) -> RuntimeResult<()>
    where
        T: AsyncRead + AsyncWrite + Send + 'static,
        F: Future<Output = ()>,
    {
        self.wire()?;

        let Self {
            config,
            registry,
            bot,
            outbound,
        } = self;
        let basic = registry.get::<BasicMux>()?;

        let (sink, lines) = connection::framed(io).split();
        let stop_writer = CancellationToken::new();
        let writer = connection::spawn_writer(sink, outbound, stop_writer.clone());

        for line in connection::registration_lines(&config.core) {
            bot.write(line)?;
        }
        info!(nick = %config.core.nick, "Connected, registering");

        let result = intake(&bot, &basic, lines, shutdown).await;

        stop_writer.cancel();
        if let Err(e) = writer.await? {
            warn!("Failed to flush outbound lines: {e}");
        }
        info!("Disconnected");
        result
    }
}

/// Reads and dispatches lines until EOF, a transport error or `shutdown`.
async fn intake<S, F>(bot: &Arc<Bot>, basic: &BasicMux, mut lines: S, shutdown: F) -> RuntimeResult<()>
where
    S: Stream<Item = Result<String, LinesCodecError>> + Unpin,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    loop {
        let next = tokio::select! {
            () = &mut shutdown => {
                info!("Shutdown requested");
                let _ = bot.write("QUIT :Shutting down");
                return Ok(());
            }
            next = lines.next() => next,
        };

        match next {
            Some(Ok(line)) => handle_line(bot, basic, &line),
            Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                warn!("Discarding overlong line");
            }
            Some(Err(e)) => return Err(e.into()),
            None => {
                info!("Connection closed by server");
                return Ok(());
            }
        }
    }
}

fn handle_line(bot: &Arc<Bot>, basic: &BasicMux, line: &str) {
    if line.trim().is_empty() {
        return;
    }
    trace!("<< {line}");
    match line.parse::<Event>() {
        Ok(event) => {
            basic.dispatch(bot, &event);
        }
        Err(e) => warn!(line = %line, "Skipping malformed line: {e}"),
    }
}

/// Waits for Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = signal::ctrl_c() => info!("Received Ctrl+C, shutting down"),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
                }
                return;
            }
            Err(e) => warn!("Failed to register SIGTERM handler: {e}"),
        }
    }

    if let Err(e) = signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C, shutting down");
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for creating a `PerchRuntime` with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// let runtime = PerchRuntime::builder()
///     .config_file("deploy/perch.toml")
///     .profile("production")
///     .build()?;
/// ```
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
}

impl RuntimeBuilder {
    /// Creates a new runtime builder searching the current and user config
    /// directories.
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new()
                .with_current_dir()
                .with_user_config_dir(),
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g., "development", "production").
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges additional configuration programmatically.
    pub fn merge(mut self, config: PerchConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Loads the configuration without building a runtime.
    pub fn load(self) -> ConfigResult<PerchConfig> {
        self.config_loader.load()
    }

    /// Builds the runtime.
    pub fn build(self) -> RuntimeResult<PerchRuntime> {
        let config = self.config_loader.load()?;
        PerchRuntime::from_config(config)
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuntimeError;
    use perch_framework::{CommandMux, PluginError};
    use std::sync::atomic::{AtomicBool, Ordering};

    fn config(plugins: Option<Vec<&str>>) -> PerchConfig {
        let mut config = PerchConfig::default();
        config.core.nick = "bot".into();
        config.core.user = "herbert".into();
        config.core.name = "Herbert Bot".into();
        config.core.cmds = vec!["JOIN #perch".into()];
        config.core.plugins = plugins.map(|p| p.into_iter().map(String::from).collect());
        config
    }

    fn flag_plugin(runtime: &PerchRuntime, name: &str) -> Arc<AtomicBool> {
        let flag = Arc::new(AtomicBool::new(false));
        let f = Arc::clone(&flag);
        runtime
            .register(name, move |()| {
                f.store(true, Ordering::SeqCst);
                Ok::<_, Infallible>(())
            })
            .unwrap();
        flag
    }

    #[test]
    fn test_invalid_config_is_refused() {
        let mut bad = config(None);
        bad.core.port = 0;
        assert!(matches!(
            PerchRuntime::from_config(bad),
            Err(RuntimeError::Config(_))
        ));
    }

    #[test]
    fn test_wire_all_plugins_by_default() {
        let runtime = PerchRuntime::from_config(config(None)).unwrap();
        let a = flag_plugin(&runtime, "a");
        let b = flag_plugin(&runtime, "b");

        runtime.wire().unwrap();
        assert!(a.load(Ordering::SeqCst));
        assert!(b.load(Ordering::SeqCst));
        assert!(runtime.registry().is_resolved(SESSION));
    }

    #[test]
    fn test_wire_respects_plugin_list() {
        let runtime = PerchRuntime::from_config(config(Some(vec!["b"]))).unwrap();
        let a = flag_plugin(&runtime, "a");
        let b = flag_plugin(&runtime, "b");

        runtime.wire().unwrap();
        assert!(!a.load(Ordering::SeqCst));
        assert!(b.load(Ordering::SeqCst));
    }

    #[test]
    fn test_wire_unknown_plugin_is_fatal() {
        let runtime = PerchRuntime::from_config(config(Some(vec!["missing"]))).unwrap();
        assert!(matches!(
            runtime.wire(),
            Err(RuntimeError::Plugin(PluginError::UnknownPlugin { .. }))
        ));
    }

    #[test]
    fn test_command_mux_sees_privmsg_before_mentions() {
        let runtime = PerchRuntime::from_config(config(None)).unwrap();
        runtime.wire().unwrap();

        let basic = runtime.bot().plugin::<BasicMux>().unwrap();
        // command mux, then mention mux
        assert_eq!(basic.subscriber_count("PRIVMSG"), 2);
        assert_eq!(runtime.bot().plugin::<CommandMux>().unwrap().prefix(), "!");
    }

    #[tokio::test]
    async fn test_session_over_mock_connection() {
        let runtime = PerchRuntime::from_config(config(None)).unwrap();
        runtime
            .register("hello", |cmds: Arc<CommandMux>| {
                cmds.event("hello", |bot, event| Ok(bot.mention_reply(event, "hi")?), None)?;
                anyhow::Ok(())
            })
            .unwrap();

        let io = tokio_test::io::Builder::new()
            .write(b"NICK bot\r\n")
            .write(b"USER herbert 0 * :Herbert Bot\r\n")
            .read(b":irc.example.net 001 bot :Welcome\r\n")
            .write(b"JOIN #perch\r\n")
            .read(b"PING :irc.example.net\r\n")
            .write(b"PONG :irc.example.net\r\n")
            .read(b"this is not a valid line\r\n:belak!b@host PRIVMSG #perch :!hello\r\n")
            .write(b"PRIVMSG #perch :belak: hi\r\n")
            .build();

        runtime
            .run_on(io, std::future::pending::<()>())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_sends_quit() {
        let runtime = PerchRuntime::from_config(config(None)).unwrap();
        let io = tokio_test::io::Builder::new()
            .write(b"NICK bot\r\n")
            .write(b"USER herbert 0 * :Herbert Bot\r\n")
            .write(b"QUIT :Shutting down\r\n")
            .build();

        runtime.run_on(io, std::future::ready(())).await.unwrap();
    }
}
