//! Event routing.
//!
//! Routing is layered. The runtime feeds every parsed [`Event`] to a single
//! [`BasicMux`], which fans it out by verb. [`CommandMux`] and
//! [`MentionMux`] are ordinary `PRIVMSG` subscribers of that mux and perform
//! their own secondary dispatch:
//!
//! ```text
//! line ─▶ Event ─▶ BasicMux ──┬─▶ PING / 001 / NICK … subscribers
//!                             ├─▶ CommandMux ─▶ one command handler
//!                             └─▶ MentionMux ─▶ every mention handler
//! ```
//!
//! Dispatch is synchronous at every layer and each handler is isolated: a
//! failure is logged and never stops the remaining handlers.
//!
//! [`Event`]: perch_core::Event

mod basic;
mod command;
mod help;
mod mention;

pub use basic::BasicMux;
pub use command::{CommandMux, HELP_TRIGGER, Visibility};
pub use help::HelpInfo;
pub use mention::MentionMux;
