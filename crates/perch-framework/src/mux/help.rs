//! Help text attached to commands and mentions.

use std::fmt;

/// Describes how to use a command or mention.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HelpInfo {
    /// Argument synopsis, e.g. `"<nick>"`. May be empty.
    pub usage: String,
    /// One-line description.
    pub description: String,
}

impl HelpInfo {
    /// Creates help text from a usage synopsis and a description.
    pub fn new(usage: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            usage: usage.into(),
            description: description.into(),
        }
    }

    /// Help text with a description but no arguments.
    pub fn describe(description: impl Into<String>) -> Self {
        Self::new("", description)
    }
}

impl fmt::Display for HelpInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.usage.is_empty(), self.description.is_empty()) {
            (true, _) => f.write_str(&self.description),
            (false, true) => f.write_str(&self.usage),
            (false, false) => write!(f, "{}: {}", self.usage, self.description),
        }
    }
}
