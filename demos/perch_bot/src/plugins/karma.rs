//! Karma tracking.
//!
//! `name++` and `name--` in a channel adjust a score; `!karma <nick>` reports
//! it. Raising your own karma lowers it instead. Scores live in the
//! [`KarmaStore`] plugin, which other plugins can depend on as well.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

use parking_lot::Mutex;
use perch::core::verb;
use perch::framework::{BasicMux, CommandMux, HelpInfo, PluginError, PluginRegistry};
use regex::Regex;

/// Plugin name.
pub const NAME: &str = "karma";
/// Name of the storage plugin.
pub const STORE: &str = "karma_store";

/// Largest change a single message may apply to one name.
pub const MAX_CHANGE: i64 = 5;

const KARMA_PATTERN: &str = r#"(\w{2,}|".+?")(\+\++|--+)(?:\s|$)"#;

/// In-memory karma scores, keyed case-insensitively.
#[derive(Debug, Default)]
pub struct KarmaStore {
    scores: Mutex<HashMap<String, i64>>,
}

impl KarmaStore {
    pub fn get(&self, name: &str) -> i64 {
        self.scores.lock().get(&Self::key(name)).copied().unwrap_or(0)
    }

    /// Adds `diff` to `name`'s score and returns the new score.
    pub fn update(&self, name: &str, diff: i64) -> i64 {
        let mut scores = self.scores.lock();
        let score = scores.entry(Self::key(name)).or_default();
        *score += diff;
        *score
    }

    fn key(name: &str) -> String {
        name.trim().to_lowercase()
    }
}

struct Karma {
    pattern: Regex,
    store: Arc<KarmaStore>,
}

impl Karma {
    /// Net change per name in `text`, in order of first appearance.
    fn changes(&self, sender: &str, text: &str) -> Vec<(String, i64)> {
        let mut changes: Vec<(String, i64)> = Vec::new();
        for caps in self.pattern.captures_iter(text) {
            let name = caps[1].trim_matches('"');
            let op = &caps[2];

            // One less than the operator length: `++` is 1, `+++` is 2.
            let mut diff = op.len() as i64 - 1;
            if op.starts_with('-') || KarmaStore::key(name) == KarmaStore::key(sender) {
                diff = -diff;
            }

            let key = KarmaStore::key(name);
            match changes.iter_mut().find(|(n, _)| KarmaStore::key(n) == key) {
                Some((_, total)) => *total += diff,
                None => changes.push((name.to_string(), diff)),
            }
        }
        changes
    }
}

pub fn register(registry: &PluginRegistry) -> Result<(), PluginError> {
    registry.register(STORE, |()| Ok::<_, Infallible>(KarmaStore::default()))?;

    registry.register(
        NAME,
        |(basic, cmds, store): (Arc<BasicMux>, Arc<CommandMux>, Arc<KarmaStore>)| {
            let karma = Arc::new(Karma {
                pattern: Regex::new(KARMA_PATTERN)?,
                store,
            });

            let lookup = Arc::clone(&karma);
            cmds.event(
                NAME,
                move |bot, event| {
                    let term = match event.trailing().trim() {
                        "" => event.source_name().unwrap_or_default(),
                        term => term,
                    };
                    bot.mention_reply(
                        event,
                        format_args!("{term}'s karma is {}", lookup.store.get(term)),
                    )?;
                    Ok(())
                },
                Some(HelpInfo::new("<nick>", "Displays karma for given user")),
            )?;

            basic.subscribe(verb::PRIVMSG, move |bot, event| {
                if event.params.len() < 2 || !event.from_channel() {
                    return Ok(());
                }
                let sender = event.source_name().unwrap_or_default();

                let mut capped = false;
                for (name, diff) in karma.changes(sender, event.trailing()) {
                    let clamped = diff.clamp(-MAX_CHANGE, MAX_CHANGE);
                    capped |= clamped != diff;
                    let score = karma.store.update(&name, clamped);
                    bot.reply(event, format_args!("{name}'s karma is now {score}"))?;
                }
                if capped {
                    bot.reply(
                        event,
                        format_args!("Buzzkill Mode (tm) enforced a maximum karma change of {MAX_CHANGE}"),
                    )?;
                }
                Ok(())
            });

            anyhow::Ok(())
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::test_support::Host;
    use perch::framework::ConfigSections;

    fn host() -> Host {
        let host = Host::new(ConfigSections::new());
        register(&host.registry).unwrap();
        host.registry.resolve(NAME).unwrap();
        host
    }

    #[test]
    fn test_store_is_case_insensitive() {
        let store = KarmaStore::default();
        assert_eq!(store.update("Rust", 2), 2);
        assert_eq!(store.update(" rust ", -1), 1);
        assert_eq!(store.get("RUST"), 1);
        assert_eq!(store.get("go"), 0);
    }

    #[test]
    fn test_increments_and_decrements() {
        let mut host = host();
        host.feed(":belak!b@host PRIVMSG #perch :rust++ go-- c++");
        assert_eq!(
            host.sent(),
            vec![
                "PRIVMSG #perch :rust's karma is now 1",
                "PRIVMSG #perch :go's karma is now -1",
            ]
        );
    }

    #[test]
    fn test_self_karma_is_reversed() {
        let mut host = host();
        host.feed(":belak!b@host PRIVMSG #perch :Belak++");
        assert_eq!(host.sent(), vec!["PRIVMSG #perch :Belak's karma is now -1"]);
    }

    #[test]
    fn test_quoted_names_and_merging() {
        let mut host = host();
        host.feed(r#":belak!b@host PRIVMSG #perch :"rust lang"++ rust++ rust++"#);
        assert_eq!(
            host.sent(),
            vec![
                "PRIVMSG #perch :rust lang's karma is now 1",
                "PRIVMSG #perch :rust's karma is now 2",
            ]
        );
    }

    #[test]
    fn test_merging_ignores_case() {
        let mut host = host();
        host.feed(":belak!b@host PRIVMSG #perch :Rust++ rust++ RUST--");
        assert_eq!(host.sent(), vec!["PRIVMSG #perch :Rust's karma is now 1"]);
        assert_eq!(host.registry.get::<KarmaStore>().unwrap().get("rust"), 1);
    }

    #[test]
    fn test_buzzkill_caps_changes() {
        let mut host = host();
        host.feed(":belak!b@host PRIVMSG #perch :rust+++++++++");
        assert_eq!(
            host.sent(),
            vec![
                "PRIVMSG #perch :rust's karma is now 5",
                "PRIVMSG #perch :Buzzkill Mode (tm) enforced a maximum karma change of 5",
            ]
        );
    }

    #[test]
    fn test_private_messages_are_ignored() {
        let mut host = host();
        host.feed(":belak!b@host PRIVMSG bot :rust++");
        assert!(host.sent().is_empty());
        assert_eq!(host.registry.get::<KarmaStore>().unwrap().get("rust"), 0);
    }

    #[test]
    fn test_karma_command() {
        let mut host = host();
        host.feed(":belak!b@host PRIVMSG #perch :rust++");
        host.sent();

        host.feed(":belak!b@host PRIVMSG #perch :!karma Rust");
        assert_eq!(host.sent(), vec!["PRIVMSG #perch :belak: Rust's karma is 1"]);

        host.feed(":belak!b@host PRIVMSG #perch :!karma");
        assert_eq!(host.sent(), vec!["PRIVMSG #perch :belak: belak's karma is 0"]);
    }

    #[test]
    fn test_karma_command_has_help() {
        let mut host = host();
        host.feed(":belak!b@host PRIVMSG #perch :!help karma");
        assert_eq!(
            host.sent(),
            vec![
                "PRIVMSG #perch :belak: Usage: !karma <nick>",
                "PRIVMSG #perch :belak: Displays karma for given user",
            ]
        );
    }

    #[test]
    fn test_store_is_shared() {
        let host = host();
        let store = host.registry.get::<KarmaStore>().unwrap();
        assert!(Arc::ptr_eq(
            &store,
            &host.bot.plugin::<KarmaStore>().unwrap()
        ));
    }
}
