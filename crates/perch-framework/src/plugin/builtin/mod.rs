//! Built-in plugins every host carries.
//!
//! | Plugin | Provides | Depends on |
//! |--------|----------|------------|
//! | [`BOT`] | [`Bot`] | (provided by [`Bot::install`]) |
//! | [`BASIC_MUX`] | [`BasicMux`] | nothing |
//! | [`COMMAND_MUX`] | [`CommandMux`] | [`Bot`], [`BasicMux`] |
//! | [`MENTION_MUX`] | [`MentionMux`] | [`BasicMux`] |
//!
//! The command and mention muxes subscribe themselves to the basic mux when
//! they are built, so the order in which they are resolved is the order in
//! which they see each `PRIVMSG`. [`BUILTIN_ORDER`] resolves the command mux
//! first.

use std::convert::Infallible;
use std::sync::Arc;

use crate::bot::Bot;
use crate::error::PluginError;
use crate::mux::{BasicMux, CommandMux, MentionMux};
use crate::plugin::PluginRegistry;

/// Name of the [`Bot`] root plugin.
pub const BOT: &str = "bot";
/// Name of the [`BasicMux`] plugin.
pub const BASIC_MUX: &str = "basic_mux";
/// Name of the [`CommandMux`] plugin.
pub const COMMAND_MUX: &str = "command_mux";
/// Name of the [`MentionMux`] plugin.
pub const MENTION_MUX: &str = "mention_mux";

/// Resolution order of the built-in muxes.
pub const BUILTIN_ORDER: [&str; 3] = [BASIC_MUX, COMMAND_MUX, MENTION_MUX];

/// Returns `true` if `name` is one of the built-in plugins.
pub fn is_builtin(name: &str) -> bool {
    name == BOT || BUILTIN_ORDER.contains(&name)
}

/// Registers the three muxes.
///
/// The [`Bot`] itself is added by [`Bot::install`].
pub fn register_builtins(registry: &PluginRegistry) -> Result<(), PluginError> {
    registry.register(BASIC_MUX, |()| Ok::<_, Infallible>(BasicMux::new()))?;

    registry.register(COMMAND_MUX, |(bot, basic): (Arc<Bot>, Arc<BasicMux>)| {
        let mux = CommandMux::new(bot.prefix());
        mux.attach(&basic);
        Ok::<_, Infallible>(mux)
    })?;

    registry.register(MENTION_MUX, |basic: Arc<BasicMux>| {
        let mux = MentionMux::new();
        mux.attach(&basic);
        Ok::<_, Infallible>(mux)
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mux::HelpInfo;
    use crate::testing::test_host;

    #[test]
    fn test_builtins_wire_in_order() {
        let (registry, bot, mut rx) = test_host("bot", Default::default());
        register_builtins(&registry).unwrap();

        registry
            .register("greeter", |(cmds, mentions): (Arc<CommandMux>, Arc<MentionMux>)| {
                cmds.event(
                    "hi",
                    |bot, event| Ok(bot.mention_reply(event, "hello!")?),
                    Some(HelpInfo::describe("Says hello")),
                )?;
                mentions.event(
                    |bot, event| {
                        if event.trailing().contains("perch") {
                            bot.reply(event, "you rang?")?;
                        }
                        Ok(())
                    },
                    None,
                );
                anyhow::Ok(())
            })
            .unwrap();

        registry.resolve_each(BUILTIN_ORDER).unwrap();
        registry.resolve_all().unwrap();

        let basic = bot.plugin::<BasicMux>().unwrap();
        assert_eq!(basic.subscriber_count("PRIVMSG"), 2);

        basic.dispatch(&bot, &":belak PRIVMSG #perch :!hi perch".parse().unwrap());
        assert_eq!(rx.try_recv().unwrap(), "PRIVMSG #perch :belak: hello!");
        assert_eq!(rx.try_recv().unwrap(), "PRIVMSG #perch :you rang?");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_muxes_are_singletons() {
        let (registry, bot, _rx) = test_host("bot", Default::default());
        register_builtins(&registry).unwrap();

        let via_bot = bot.plugin::<CommandMux>().unwrap();
        let via_registry = registry.get::<CommandMux>().unwrap();
        assert!(Arc::ptr_eq(&via_bot, &via_registry));

        let erased = bot.load_plugin(COMMAND_MUX).unwrap();
        assert!(Arc::ptr_eq(&erased.downcast::<CommandMux>().unwrap(), &via_bot));
        assert_eq!(via_bot.prefix(), "!");
    }

    #[test]
    fn test_registration_error_fails_factory() {
        let (registry, _bot, _rx) = test_host("bot", Default::default());
        register_builtins(&registry).unwrap();
        registry
            .register("clash", |cmds: Arc<CommandMux>| {
                cmds.event("help", |_, _| Ok(()), None)?;
                anyhow::Ok(())
            })
            .unwrap();

        let err = registry.resolve("clash").unwrap_err();
        assert!(matches!(err, PluginError::Factory { ref plugin, .. } if plugin == "clash"));
        assert!(err.to_string().contains("already registered"));
    }

    #[test]
    fn test_load_plugin_from_factory() {
        let (registry, _bot, _rx) = test_host("bot", Default::default());
        register_builtins(&registry).unwrap();
        registry
            .register("lazy", |bot: Arc<Bot>| {
                // Pulls the mention mux in without declaring it.
                bot.load_plugin(MENTION_MUX)?;
                anyhow::Ok(())
            })
            .unwrap();

        registry.resolve("lazy").unwrap();
        assert!(registry.is_resolved(MENTION_MUX));
        assert!(!registry.is_resolved(COMMAND_MUX));
    }

    #[test]
    fn test_is_builtin() {
        assert!(is_builtin(BOT));
        assert!(is_builtin(MENTION_MUX));
        assert!(!is_builtin("karma"));
    }
}
