//! Helpers for exercising plugins without a connection.
//!
//! Available to this crate's tests and, behind the `testing` feature, to
//! downstream crates. Outbound lines land in the returned receiver:
//!
//! ```rust,ignore
//! let (bot, mut rx) = test_bot("bot");
//! bot.reply(&event, "hi")?;
//! assert_eq!(rx.try_recv()?, "PRIVMSG #perch :hi");
//! ```

use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver};

use crate::bot::{Bot, BotSettings, ConfigSections};
use crate::plugin::PluginRegistry;

/// Creates a registry holding a [`Bot`] named `nick` with the given
/// configuration sections.
///
/// The caller owns the registry; once it is dropped the bot can no longer
/// load plugins.
pub fn test_host(
    nick: &str,
    sections: ConfigSections,
) -> (Arc<PluginRegistry>, Arc<Bot>, UnboundedReceiver<String>) {
    let registry = Arc::new(PluginRegistry::new());
    let (tx, rx) = mpsc::unbounded_channel();
    let settings = BotSettings {
        nick: nick.to_string(),
        ..BotSettings::default()
    };
    let bot = match Bot::install(settings, sections, tx, &registry) {
        Ok(bot) => bot,
        Err(e) => panic!("fresh registry refused the bot: {e}"),
    };
    (registry, bot, rx)
}

/// Creates a standalone [`Bot`] named `nick` with prefix `!`.
pub fn test_bot(nick: &str) -> (Arc<Bot>, UnboundedReceiver<String>) {
    test_bot_with(nick, ConfigSections::new())
}

/// Like [`test_bot`], with configuration sections.
pub fn test_bot_with(nick: &str, sections: ConfigSections) -> (Arc<Bot>, UnboundedReceiver<String>) {
    let (_registry, bot, rx) = test_host(nick, sections);
    (bot, rx)
}
