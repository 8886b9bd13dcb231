//! # Perch Core
//!
//! Protocol envelope types shared by every Perch crate.
//!
//! The core deliberately understands only the minimal shape of a line:
//! who sent it ([`Prefix`]), the command verb, and its parameters
//! ([`Event`]). Routing, plugins and the bot façade live in
//! `perch-framework`; the connection and configuration live in
//! `perch-runtime`.

pub mod error;
pub mod event;
pub mod prefix;

pub use error::{ParseError, ParseResult};
pub use event::{Event, is_channel_name, verb};
pub use prefix::Prefix;
