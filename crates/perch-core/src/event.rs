//! Inbound event envelope.
//!
//! An [`Event`] is the minimal structured form of one protocol line: an
//! optional source [`Prefix`], the command verb and its ordered parameters.
//! Nothing beyond that envelope is interpreted here.
//!
//! ```rust
//! use perch_core::Event;
//!
//! let event: Event = ":belak!b@host PRIVMSG #perch :!karma belak".parse().unwrap();
//! assert_eq!(event.command, "PRIVMSG");
//! assert_eq!(event.target(), Some("#perch"));
//! assert_eq!(event.trailing(), "!karma belak");
//! assert!(event.from_channel());
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;
use crate::prefix::Prefix;

/// Well-known command verbs and numerics.
pub mod verb {
    /// Message delivery.
    pub const PRIVMSG: &str = "PRIVMSG";
    /// Notice delivery.
    pub const NOTICE: &str = "NOTICE";
    /// Server keepalive request.
    pub const PING: &str = "PING";
    /// Keepalive reply.
    pub const PONG: &str = "PONG";
    /// Nickname change.
    pub const NICK: &str = "NICK";
    /// Channel join.
    pub const JOIN: &str = "JOIN";
    /// Registration complete.
    pub const RPL_WELCOME: &str = "001";
    /// Requested nickname is taken.
    pub const ERR_NICKNAMEINUSE: &str = "433";
}

/// Leading characters that mark a target as a channel.
const CHANNEL_PREFIXES: [char; 2] = ['#', '&'];

/// Returns `true` if `target` names a channel rather than a user.
pub fn is_channel_name(target: &str) -> bool {
    target.starts_with(CHANNEL_PREFIXES)
}

/// A decoded protocol line.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Event {
    /// Origin of the line, if the server supplied one.
    pub source: Option<Prefix>,
    /// Command verb, upper-cased (`PRIVMSG`, `001`, …).
    pub command: String,
    /// Ordered parameters; the trailing parameter is the last element.
    pub params: Vec<String>,
}

impl Event {
    /// Creates an event without a source.
    pub fn new<I, S>(command: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            source: None,
            command: command.into(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    /// Builds a `PRIVMSG` from `source` to `target`.
    pub fn privmsg(source: Prefix, target: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: Some(source),
            command: verb::PRIVMSG.to_string(),
            params: vec![target.into(), text.into()],
        }
    }

    /// Attaches a source prefix.
    pub fn with_source(mut self, source: Prefix) -> Self {
        self.source = Some(source);
        self
    }

    /// The first parameter: the channel or nick a message was sent to.
    pub fn target(&self) -> Option<&str> {
        self.params.first().map(String::as_str)
    }

    /// The last parameter, or `""` when there are none.
    pub fn trailing(&self) -> &str {
        self.params.last().map(String::as_str).unwrap_or("")
    }

    /// The nickname (or server name) of the sender.
    pub fn source_name(&self) -> Option<&str> {
        self.source.as_ref().map(|p| p.name.as_str())
    }

    /// Returns `true` if the first parameter names a channel.
    pub fn from_channel(&self) -> bool {
        self.target().is_some_and(is_channel_name)
    }

    /// Returns a copy whose trailing parameter is replaced by `text`.
    ///
    /// Events without parameters gain `text` as their only parameter.
    pub fn with_trailing(&self, text: impl Into<String>) -> Self {
        let mut event = self.clone();
        match event.params.last_mut() {
            Some(last) => *last = text.into(),
            None => event.params.push(text.into()),
        }
        event
    }
}

impl FromStr for Event {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return Err(ParseError::EmptyLine);
        }

        let mut rest = line.trim_start_matches(' ');

        // Tags are not part of the envelope.
        if rest.starts_with('@') {
            rest = rest.split_once(' ').map(|(_, r)| r).unwrap_or("");
            rest = rest.trim_start_matches(' ');
        }

        let mut source = None;
        if let Some(stripped) = rest.strip_prefix(':') {
            let (raw, r) = stripped.split_once(' ').unwrap_or((stripped, ""));
            source = Some(raw.parse::<Prefix>()?);
            rest = r.trim_start_matches(' ');
        }

        let (command, mut rest) = rest.split_once(' ').unwrap_or((rest, ""));
        if command.is_empty() {
            return Err(ParseError::MissingCommand {
                line: line.to_string(),
            });
        }
        if !command.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ParseError::InvalidCommand {
                command: command.to_string(),
            });
        }

        let mut params = Vec::new();
        loop {
            rest = rest.trim_start_matches(' ');
            if rest.is_empty() {
                break;
            }
            if let Some(trailing) = rest.strip_prefix(':') {
                params.push(trailing.to_string());
                break;
            }
            let (param, r) = rest.split_once(' ').unwrap_or((rest, ""));
            params.push(param.to_string());
            rest = r;
        }

        Ok(Self {
            source,
            command: command.to_ascii_uppercase(),
            params,
        })
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(source) = &self.source {
            write!(f, ":{source} ")?;
        }
        f.write_str(&self.command)?;

        let Some((last, middle)) = self.params.split_last() else {
            return Ok(());
        };
        for param in middle {
            write!(f, " {param}")?;
        }
        if last.is_empty() || last.contains(' ') || last.starts_with(':') {
            write!(f, " :{last}")
        } else {
            write!(f, " {last}")
        }
    }
}
