//! Plugin system.
//!
//! # Architecture
//!
//! A plugin is a named factory registered with a [`PluginRegistry`]. The
//! factory's argument declares what it depends on and its return value is
//! what it provides to other plugins:
//!
//! ```rust,ignore
//! use perch::prelude::*;
//!
//! // Provides `KarmaStore`, depends on nothing.
//! registry.register("karma_store", |()| Ok::<_, Infallible>(KarmaStore::default()))?;
//!
//! // Provides nothing, depends on the command mux and the store.
//! registry.register("karma", |(cmds, store): (Arc<CommandMux>, Arc<KarmaStore>)| {
//!     cmds.event("karma", move |bot, event| { /* … */ Ok(()) }, None)?;
//!     anyhow::Ok(())
//! })?;
//! ```
//!
//! Plugins are singletons. The first [`resolve`](PluginRegistry::resolve)
//! of a name builds its dependencies, runs the factory and caches the
//! result; every later consumer receives the same `Arc`.
//!
//! # Built-in plugins
//!
//! [`builtin`] names the plugins every host carries: the [`Bot`] façade and
//! the three muxes. Feature plugins depend on them like on any other plugin.
//!
//! [`Bot`]: crate::Bot

pub mod builtin;
mod dependency;
mod descriptor;
mod registry;

pub use dependency::{Dependencies, Dependency, Instance, TypeToken};
pub use descriptor::PluginDescriptor;
pub use registry::PluginRegistry;
