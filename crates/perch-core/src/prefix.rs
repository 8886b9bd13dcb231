//! Message source prefix (`nick!user@host`).

use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// The source of an inbound line.
///
/// Server-originated lines carry only a `name` (the server name); lines from
/// users carry the full `nick!user@host` triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Prefix {
    /// Nickname or server name.
    pub name: String,
    /// Username (ident), if present.
    pub user: Option<String>,
    /// Hostname, if present.
    pub host: Option<String>,
}

impl Prefix {
    /// Creates a prefix with only a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            user: None,
            host: None,
        }
    }

    /// Creates a full `nick!user@host` prefix.
    pub fn user(
        nick: impl Into<String>,
        user: impl Into<String>,
        host: impl Into<String>,
    ) -> Self {
        Self {
            name: nick.into(),
            user: Some(user.into()),
            host: Some(host.into()),
        }
    }
}

impl FromStr for Prefix {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseError::InvalidPrefix {
                prefix: s.to_string(),
                reason: "empty prefix",
            });
        }
        if s.contains(char::is_whitespace) {
            return Err(ParseError::InvalidPrefix {
                prefix: s.to_string(),
                reason: "prefix contains whitespace",
            });
        }

        let (rest, host) = match s.split_once('@') {
            Some((rest, host)) => (rest, Some(host.to_string())),
            None => (s, None),
        };
        let (name, user) = match rest.split_once('!') {
            Some((name, user)) => (name, Some(user.to_string())),
            None => (rest, None),
        };

        if name.is_empty() {
            return Err(ParseError::InvalidPrefix {
                prefix: s.to_string(),
                reason: "missing name",
            });
        }

        Ok(Self {
            name: name.to_string(),
            user,
            host,
        })
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some(user) = &self.user {
            write!(f, "!{user}")?;
        }
        if let Some(host) = &self.host {
            write!(f, "@{host}")?;
        }
        Ok(())
    }
}
