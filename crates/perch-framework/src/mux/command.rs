//! Prefix-triggered commands.
//!
//! A [`CommandMux`] looks at every `PRIVMSG` and decides whether it is a
//! command addressed to the bot:
//!
//! - In a channel the text must start with the configured prefix
//!   (`!karma belak`).
//! - In a private message to the bot the prefix is optional (`karma belak`
//!   and `!karma belak` both work).
//!
//! The first word after the prefix selects the command; the rest of the line
//! is handed to the handler as the event's trailing text. Each command can be
//! limited to channels or to private messages with a [`Visibility`].
//!
//! Every mux carries a built-in `help` command that lists registered
//! commands and shows their [`HelpInfo`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::{Level, debug, span, trace};

use super::basic::BasicMux;
use super::help::HelpInfo;
use crate::bot::Bot;
use crate::error::RegistrationError;
use crate::handler::{self, BoxedHandler, HandlerResult};
use perch_core::{Event, verb};

/// Trigger of the built-in help command.
pub const HELP_TRIGGER: &str = "help";

/// Where a command may be invoked from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// Channels and private messages.
    #[default]
    Both,
    /// Channels only.
    ChannelOnly,
    /// Private messages only.
    PrivateOnly,
}

impl Visibility {
    /// Returns `true` if a command with this visibility may fire in the
    /// given context.
    pub fn permits(self, private: bool) -> bool {
        match self {
            Self::Both => true,
            Self::ChannelOnly => !private,
            Self::PrivateOnly => private,
        }
    }
}

struct CommandEntry {
    handler: BoxedHandler,
    visibility: Visibility,
    help: Option<HelpInfo>,
}

struct CommandInner {
    prefix: String,
    commands: RwLock<BTreeMap<String, CommandEntry>>,
}

/// Dispatches prefixed commands to their handlers.
///
/// Cloning is cheap; clones share the same command table.
#[derive(Clone)]
pub struct CommandMux {
    inner: Arc<CommandInner>,
}

impl CommandMux {
    /// Creates a mux that recognises commands starting with `prefix`.
    ///
    /// The mux starts with the `help` command registered.
    pub fn new(prefix: impl Into<String>) -> Self {
        let inner = Arc::new_cyclic(|weak: &Weak<CommandInner>| {
            let weak = Weak::clone(weak);
            let help = CommandEntry {
                handler: handler::boxed(move |bot, event| match weak.upgrade() {
                    Some(inner) => inner.help(bot, event),
                    None => Ok(()),
                }),
                visibility: Visibility::Both,
                help: Some(HelpInfo::new("[command]", "Displays help for commands")),
            };

            let mut commands = BTreeMap::new();
            commands.insert(HELP_TRIGGER.to_string(), help);
            CommandInner {
                prefix: prefix.into(),
                commands: RwLock::new(commands),
            }
        });
        Self { inner }
    }

    /// The trigger prefix.
    pub fn prefix(&self) -> &str {
        &self.inner.prefix
    }

    // ─── Registration ────────────────────────────────────────────────────────

    /// Registers a command usable in channels and in private.
    pub fn event<F>(
        &self,
        trigger: impl Into<String>,
        handler: F,
        help: Option<HelpInfo>,
    ) -> Result<(), RegistrationError>
    where
        F: Fn(&Arc<Bot>, &Event) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(trigger, Visibility::Both, handler::boxed(handler), help)
    }

    /// Registers a command usable only in channels.
    pub fn channel<F>(
        &self,
        trigger: impl Into<String>,
        handler: F,
        help: Option<HelpInfo>,
    ) -> Result<(), RegistrationError>
    where
        F: Fn(&Arc<Bot>, &Event) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(trigger, Visibility::ChannelOnly, handler::boxed(handler), help)
    }

    /// Registers a command usable only in private messages.
    pub fn private<F>(
        &self,
        trigger: impl Into<String>,
        handler: F,
        help: Option<HelpInfo>,
    ) -> Result<(), RegistrationError>
    where
        F: Fn(&Arc<Bot>, &Event) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(trigger, Visibility::PrivateOnly, handler::boxed(handler), help)
    }

    /// Registers a boxed handler with an explicit visibility.
    ///
    /// # Errors
    ///
    /// Refuses empty triggers, triggers containing whitespace, and triggers
    /// already registered on this mux (including `help`).
    pub fn register(
        &self,
        trigger: impl Into<String>,
        visibility: Visibility,
        handler: BoxedHandler,
        help: Option<HelpInfo>,
    ) -> Result<(), RegistrationError> {
        let trigger = trigger.into();
        validate_trigger(&trigger)?;

        let mut commands = self.inner.commands.write();
        if commands.contains_key(&trigger) {
            return Err(RegistrationError::DuplicateTrigger { trigger });
        }
        debug!(trigger = %trigger, visibility = ?visibility, "Command registered");
        commands.insert(
            trigger,
            CommandEntry {
                handler,
                visibility,
                help,
            },
        );
        Ok(())
    }

    /// Registered triggers, in lexicographic order.
    pub fn triggers(&self) -> Vec<String> {
        self.inner.commands.read().keys().cloned().collect()
    }

    /// Visibility of `trigger`, if registered.
    pub fn visibility(&self, trigger: &str) -> Option<Visibility> {
        self.inner.commands.read().get(trigger).map(|c| c.visibility)
    }

    /// Help text of `trigger`, if registered with any.
    pub fn help_for(&self, trigger: &str) -> Option<HelpInfo> {
        self.inner
            .commands
            .read()
            .get(trigger)
            .and_then(|c| c.help.clone())
    }

    /// Number of registered commands, `help` included.
    pub fn len(&self) -> usize {
        self.inner.commands.read().len()
    }

    /// Always `false`: `help` is always registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ─── Dispatch ────────────────────────────────────────────────────────────

    /// Subscribes this mux to `PRIVMSG` events on `basic`.
    pub fn attach(&self, basic: &BasicMux) {
        let mux = self.clone();
        basic.subscribe(verb::PRIVMSG, move |bot, event| {
            mux.dispatch(bot, event);
            Ok(())
        });
    }

    /// Dispatches `event` to the command it triggers, if any.
    ///
    /// Returns `true` if a command handler ran and succeeded. Misses, refused
    /// visibility and non-`PRIVMSG` events are silent.
    pub fn dispatch(&self, bot: &Arc<Bot>, event: &Event) -> bool {
        // Without a message body the target would double as the text.
        if event.command != verb::PRIVMSG || event.params.len() < 2 {
            return false;
        }
        let Some(target) = event.target() else {
            return false;
        };
        let private = bot.is_self(target);

        let text = event.trailing();
        let body = match text.strip_prefix(self.prefix()) {
            Some(rest) => rest,
            None if private => text,
            None => return false,
        };

        let (trigger, args) = match body.split_once(char::is_whitespace) {
            Some((trigger, rest)) => (trigger, rest.trim()),
            None => (body, ""),
        };
        if trigger.is_empty() {
            return false;
        }

        let (handler, visibility) = match self.inner.commands.read().get(trigger) {
            Some(entry) => (BoxedHandler::clone(&entry.handler), entry.visibility),
            None => {
                trace!(trigger = %trigger, "Unknown command");
                return false;
            }
        };
        if !visibility.permits(private) {
            trace!(trigger = %trigger, private, "Command refused by visibility");
            return false;
        }

        let span = span!(Level::DEBUG, "command", trigger = %trigger, private);
        let _enter = span.enter();
        handler::invoke(&handler, bot, &event.with_trailing(args), trigger)
    }
}

impl CommandInner {
    fn help(&self, bot: &Arc<Bot>, event: &Event) -> HandlerResult {
        let query = event.trailing().trim();
        if query.is_empty() {
            let listing = self
                .commands
                .read()
                .iter()
                .map(|(trigger, entry)| match &entry.help {
                    Some(help) if !help.usage.is_empty() => format!("{trigger} {}", help.usage),
                    _ => trigger.clone(),
                })
                .collect::<Vec<_>>()
                .join(", ");
            bot.mention_reply(
                event,
                format_args!(
                    "Available commands: {listing}. Use {}{HELP_TRIGGER} <command> for more info.",
                    self.prefix
                ),
            )?;
            return Ok(());
        }

        let trigger = query.strip_prefix(self.prefix.as_str()).unwrap_or(query);
        let help = match self.commands.read().get(trigger) {
            Some(entry) => entry.help.clone(),
            None => {
                bot.mention_reply(event, format_args!("Unknown command {trigger:?}"))?;
                return Ok(());
            }
        };

        match help {
            Some(help) => {
                let usage = if help.usage.is_empty() {
                    format!("Usage: {}{trigger}", self.prefix)
                } else {
                    format!("Usage: {}{trigger} {}", self.prefix, help.usage)
                };
                bot.mention_reply(event, usage)?;
                if !help.description.is_empty() {
                    bot.mention_reply(event, &help.description)?;
                }
            }
            None => {
                bot.mention_reply(
                    event,
                    format_args!("There is no help available for command {trigger:?}"),
                )?;
            }
        }
        Ok(())
    }
}

fn validate_trigger(trigger: &str) -> Result<(), RegistrationError> {
    let reason = if trigger.is_empty() {
        "trigger is empty"
    } else if trigger.chars().any(char::is_whitespace) {
        "trigger contains whitespace"
    } else {
        return Ok(());
    };
    Err(RegistrationError::InvalidTrigger {
        trigger: trigger.to_string(),
        reason,
    })
}

impl fmt::Debug for CommandMux {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandMux")
            .field("prefix", &self.inner.prefix)
            .field("triggers", &self.triggers())
            .finish()
    }
}
