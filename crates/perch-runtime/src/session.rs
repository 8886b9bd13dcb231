//! Connection housekeeping handlers.
//!
//! These keep the session alive and the bot's idea of its own nick in sync
//! with the server. They are ordinary [`BasicMux`] subscribers, wired as the
//! [`SESSION`] plugin before any feature plugin.

use std::sync::Arc;

use tracing::{info, warn};

use perch_core::verb;
use perch_framework::BasicMux;

/// Name of the session plugin.
pub const SESSION: &str = "session";

/// Subscribes the session handlers to `basic`.
///
/// `cmds` are raw lines sent once the server has accepted our registration.
pub fn install(basic: &BasicMux, cmds: Vec<String>) {
    basic.subscribe(verb::PING, |bot, event| {
        bot.write(format!("{} :{}", verb::PONG, event.trailing()))?;
        Ok(())
    });

    let cmds = Arc::new(cmds);
    basic.subscribe(verb::RPL_WELCOME, move |bot, event| {
        if let Some(nick) = event.target() {
            bot.set_nick(nick);
        }
        info!(nick = %bot.nick(), "Registered with server");
        for line in cmds.iter() {
            bot.write(line)?;
        }
        Ok(())
    });

    basic.subscribe(verb::ERR_NICKNAMEINUSE, |bot, _| {
        let nick = format!("{}_", bot.nick());
        warn!(nick = %nick, "Nick in use, retrying");
        bot.set_nick(&nick);
        bot.write(format!("{} {nick}", verb::NICK))?;
        Ok(())
    });

    basic.subscribe(verb::NICK, |bot, event| {
        let from_self = event.source_name().is_some_and(|name| bot.is_self(name));
        if from_self && let Some(nick) = event.params.first() {
            info!(nick = %nick, "Nick changed");
            bot.set_nick(nick.as_str());
        }
        Ok(())
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use perch_core::Event;
    use perch_framework::testing::test_bot;

    fn dispatch(basic: &BasicMux, bot: &Arc<perch_framework::Bot>, line: &str) {
        let event: Event = line.parse().unwrap();
        basic.dispatch(bot, &event);
    }

    #[test]
    fn test_ping_pong() {
        let (bot, mut rx) = test_bot("bot");
        let basic = BasicMux::new();
        install(&basic, Vec::new());

        dispatch(&basic, &bot, "PING :irc.example.net");
        assert_eq!(rx.try_recv().unwrap(), "PONG :irc.example.net");
    }

    #[test]
    fn test_welcome_records_nick_and_sends_cmds() {
        let (bot, mut rx) = test_bot("bot");
        let basic = BasicMux::new();
        install(&basic, vec!["JOIN #perch".into(), "MODE bot_ +B".into()]);

        dispatch(&basic, &bot, ":irc.example.net 001 bot_ :Welcome");
        assert_eq!(bot.nick(), "bot_");
        assert_eq!(rx.try_recv().unwrap(), "JOIN #perch");
        assert_eq!(rx.try_recv().unwrap(), "MODE bot_ +B");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_nick_in_use_appends_underscore() {
        let (bot, mut rx) = test_bot("bot");
        let basic = BasicMux::new();
        install(&basic, Vec::new());

        dispatch(&basic, &bot, ":irc.example.net 433 * bot :Nickname is already in use");
        assert_eq!(rx.try_recv().unwrap(), "NICK bot_");
        dispatch(&basic, &bot, ":irc.example.net 433 * bot_ :Nickname is already in use");
        assert_eq!(rx.try_recv().unwrap(), "NICK bot__");
        assert_eq!(bot.nick(), "bot__");
    }

    #[test]
    fn test_nick_change_tracks_self_only() {
        let (bot, _rx) = test_bot("bot");
        let basic = BasicMux::new();
        install(&basic, Vec::new());

        dispatch(&basic, &bot, ":belak!b@host NICK :kaleb");
        assert_eq!(bot.nick(), "bot");

        dispatch(&basic, &bot, ":bot!perch@host NICK :birb");
        assert_eq!(bot.nick(), "birb");
        assert!(bot.is_self("BIRB"));
    }
}
