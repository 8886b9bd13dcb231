//! The connection-facing bot façade.
//!
//! [`Bot`] is what plugins talk to. It owns the outbound half of the
//! connection (a queue drained by the runtime's writer task), the process
//! configuration sections, the current nickname and command prefix, and a
//! handle back to the [`PluginRegistry`] so plugins can demand other plugins
//! at runtime.
//!
//! The bot is itself a plugin: [`Bot::install`] registers it under
//! [`BOT`](crate::plugin::builtin::BOT) so any factory can declare an
//! `Arc<Bot>` dependency.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, trace};

use crate::error::{BotError, BotResult, PluginError};
use crate::plugin::PluginRegistry;
use crate::plugin::builtin::BOT;
use perch_core::{Event, verb};

/// Named configuration sections, keyed by section name.
pub type ConfigSections = HashMap<String, Value>;

/// Identity and routing settings for a [`Bot`].
#[derive(Debug, Clone)]
pub struct BotSettings {
    /// Nickname requested at registration.
    pub nick: String,
    /// Command trigger prefix, e.g. `"!"`.
    pub prefix: String,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            nick: "perch".to_string(),
            prefix: "!".to_string(),
        }
    }
}

/// The host façade handed to plugins.
pub struct Bot {
    nick: RwLock<String>,
    prefix: String,
    sections: Arc<ConfigSections>,
    outbound: UnboundedSender<String>,
    registry: Weak<PluginRegistry>,
}

impl Bot {
    /// Creates a bot and registers it in `registry` as the root plugin.
    ///
    /// Lines written through the bot are queued on `outbound`.
    pub fn install(
        settings: BotSettings,
        sections: ConfigSections,
        outbound: UnboundedSender<String>,
        registry: &Arc<PluginRegistry>,
    ) -> Result<Arc<Self>, PluginError> {
        let bot = Arc::new(Self {
            nick: RwLock::new(settings.nick),
            prefix: settings.prefix,
            sections: Arc::new(sections),
            outbound,
            registry: Arc::downgrade(registry),
        });
        registry.provide(BOT, Arc::clone(&bot))?;
        Ok(bot)
    }

    // ─── Identity ────────────────────────────────────────────────────────────

    /// The bot's current nickname.
    pub fn nick(&self) -> String {
        self.nick.read().clone()
    }

    /// Records a nickname change confirmed by the server.
    pub fn set_nick(&self, nick: impl Into<String>) {
        let nick = nick.into();
        debug!(nick = %nick, "Current nick updated");
        *self.nick.write() = nick;
    }

    /// Returns `true` if `name` is the bot's own nickname.
    pub fn is_self(&self, name: &str) -> bool {
        self.nick.read().eq_ignore_ascii_case(name)
    }

    /// The command trigger prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    // ─── Output ──────────────────────────────────────────────────────────────

    /// Queues a raw protocol line.
    ///
    /// The line is cut at the first CR or LF so a single call can never
    /// emit more than one protocol line.
    pub fn write(&self, line: impl AsRef<str>) -> BotResult<()> {
        let line = line.as_ref();
        let line = line.split(['\r', '\n']).next().unwrap_or_default();
        trace!(line = %line, "Queueing outbound line");
        self.outbound
            .send(line.to_string())
            .map_err(|_| BotError::ConnectionClosed)
    }

    /// Queues a formatted raw line; enables `write!(bot, "...")`.
    pub fn write_fmt(&self, args: fmt::Arguments<'_>) -> BotResult<()> {
        match args.as_str() {
            Some(s) => self.write(s),
            None => self.write(args.to_string()),
        }
    }

    /// Sends `text` back to wherever `event` came from.
    ///
    /// Channel messages are answered in the channel; private messages are
    /// answered to the sender.
    pub fn reply(&self, event: &Event, text: impl fmt::Display) -> BotResult<()> {
        let target = self.reply_target(event)?;
        self.write(format!("{} {target} :{text}", verb::PRIVMSG))
    }

    /// Like [`reply`](Self::reply), but addresses the sender by name when
    /// answering in a channel.
    pub fn mention_reply(&self, event: &Event, text: impl fmt::Display) -> BotResult<()> {
        match (event.from_channel(), event.source_name()) {
            (true, Some(name)) => self.reply(event, format_args!("{name}: {text}")),
            _ => self.reply(event, text),
        }
    }

    fn reply_target<'a>(&self, event: &'a Event) -> BotResult<&'a str> {
        let target = if event.from_channel() {
            event.target()
        } else {
            event.source_name()
        };
        target.ok_or_else(|| BotError::NoReplyTarget {
            command: event.command.clone(),
        })
    }

    // ─── Configuration ───────────────────────────────────────────────────────

    /// Deserialises the configuration section named `section`.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// #[derive(serde::Deserialize)]
    /// struct KarmaConfig { self_penalty: bool }
    ///
    /// let cfg: KarmaConfig = bot.config("karma")?;
    /// ```
    pub fn config<T: DeserializeOwned>(&self, section: &str) -> BotResult<T> {
        let value = self
            .sections
            .get(section)
            .ok_or_else(|| BotError::MissingSection {
                section: section.to_string(),
            })?;
        T::deserialize(value).map_err(|source| BotError::InvalidSection {
            section: section.to_string(),
            source,
        })
    }

    /// Returns `true` if a configuration section named `section` exists.
    pub fn has_config(&self, section: &str) -> bool {
        self.sections.contains_key(section)
    }

    // ─── Plugins ─────────────────────────────────────────────────────────────

    /// Resolves the plugin registered as `name`, wiring it if necessary.
    pub fn load_plugin(&self, name: &str) -> Result<Arc<dyn Any + Send + Sync>, PluginError> {
        self.registry()?.resolve(name)
    }

    /// Resolves the plugin that provides `T`.
    pub fn plugin<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, PluginError> {
        self.registry()?.get::<T>()
    }

    fn registry(&self) -> Result<Arc<PluginRegistry>, PluginError> {
        self.registry.upgrade().ok_or(PluginError::RegistryClosed)
    }
}

impl fmt::Debug for Bot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bot")
            .field("nick", &*self.nick.read())
            .field("prefix", &self.prefix)
            .field("sections", &self.sections.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_bot, test_bot_with};
    use perch_core::Prefix;
    use serde::Deserialize;

    fn channel_event(text: &str) -> Event {
        Event::privmsg(Prefix::user("belak", "b", "host"), "#perch", text)
    }

    fn private_event(text: &str) -> Event {
        Event::privmsg(Prefix::user("belak", "b", "host"), "bot", text)
    }

    #[test]
    fn test_reply_in_channel() {
        let (bot, mut rx) = test_bot("bot");
        bot.reply(&channel_event("hi"), "hello").unwrap();
        assert_eq!(rx.try_recv().unwrap(), "PRIVMSG #perch :hello");
    }

    #[test]
    fn test_reply_in_private_goes_to_sender() {
        let (bot, mut rx) = test_bot("bot");
        bot.reply(&private_event("hi"), "hello").unwrap();
        assert_eq!(rx.try_recv().unwrap(), "PRIVMSG belak :hello");
    }

    #[test]
    fn test_mention_reply() {
        let (bot, mut rx) = test_bot("bot");
        bot.mention_reply(&channel_event("hi"), 42).unwrap();
        assert_eq!(rx.try_recv().unwrap(), "PRIVMSG #perch :belak: 42");

        bot.mention_reply(&private_event("hi"), "no prefix").unwrap();
        assert_eq!(rx.try_recv().unwrap(), "PRIVMSG belak :no prefix");
    }

    #[test]
    fn test_reply_without_target() {
        let (bot, _rx) = test_bot("bot");
        let event = Event::new("PRIVMSG", ["bot", "hi"]);
        assert!(matches!(
            bot.reply(&event, "x"),
            Err(BotError::NoReplyTarget { .. })
        ));
    }

    #[test]
    fn test_write_truncates_at_line_break() {
        let (bot, mut rx) = test_bot("bot");
        bot.write("PRIVMSG #a :one\r\nQUIT :two").unwrap();
        assert_eq!(rx.try_recv().unwrap(), "PRIVMSG #a :one");
    }

    #[test]
    fn test_write_macro() {
        let (bot, mut rx) = test_bot("bot");
        write!(bot, "JOIN {}", "#perch").unwrap();
        assert_eq!(rx.try_recv().unwrap(), "JOIN #perch");
    }

    #[test]
    fn test_write_after_close() {
        let (bot, rx) = test_bot("bot");
        drop(rx);
        assert!(matches!(bot.write("PING x"), Err(BotError::ConnectionClosed)));
    }

    #[test]
    fn test_nick_tracking() {
        let (bot, _rx) = test_bot("bot");
        assert!(bot.is_self("BOT"));
        bot.set_nick("bot_");
        assert_eq!(bot.nick(), "bot_");
        assert!(!bot.is_self("bot"));
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct DbConfig {
        dialect: String,
        connection: String,
    }

    #[test]
    fn test_config_sections() {
        let mut sections = ConfigSections::new();
        sections.insert(
            "db".to_string(),
            serde_json::json!({ "dialect": "sqlite", "connection": ":memory:" }),
        );
        sections.insert("broken".to_string(), serde_json::json!({ "dialect": 1 }));
        let (bot, _rx) = test_bot_with("bot", sections);

        let db: DbConfig = bot.config("db").unwrap();
        assert_eq!(db.dialect, "sqlite");
        assert!(bot.has_config("db"));

        assert!(matches!(
            bot.config::<DbConfig>("missing"),
            Err(BotError::MissingSection { section }) if section == "missing"
        ));
        assert!(matches!(
            bot.config::<DbConfig>("broken"),
            Err(BotError::InvalidSection { .. })
        ));
    }
}
