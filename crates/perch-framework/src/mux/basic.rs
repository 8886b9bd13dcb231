//! Raw verb subscription.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{Level, span, trace};

use crate::bot::Bot;
use crate::handler::{self, BoxedHandler, HandlerResult};
use perch_core::Event;

/// Routes events to handlers subscribed to their verb.
///
/// Every subscriber for a verb runs, in subscription order, with the same
/// event. A failing subscriber is logged and skipped; the rest still run.
///
/// ```rust,ignore
/// basic.subscribe("JOIN", |bot, event| {
///     if let Some(who) = event.source_name() {
///         bot.reply(event, format_args!("welcome, {who}"))?;
///     }
///     Ok(())
/// });
/// ```
#[derive(Default)]
pub struct BasicMux {
    handlers: RwLock<HashMap<String, Vec<BoxedHandler>>>,
}

impl BasicMux {
    /// Creates a mux with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `handler` to the subscribers of `verb`.
    ///
    /// Verbs are matched case-insensitively.
    pub fn subscribe<F>(&self, verb: impl AsRef<str>, handler: F)
    where
        F: Fn(&Arc<Bot>, &Event) -> HandlerResult + Send + Sync + 'static,
    {
        self.subscribe_boxed(verb, handler::boxed(handler));
    }

    /// Appends an already boxed handler.
    pub fn subscribe_boxed(&self, verb: impl AsRef<str>, handler: BoxedHandler) {
        let verb = verb.as_ref().to_ascii_uppercase();
        trace!(verb = %verb, "Handler subscribed");
        self.handlers.write().entry(verb).or_default().push(handler);
    }

    /// Invokes every subscriber of `event.command`.
    ///
    /// Returns the number of subscribers that completed successfully.
    pub fn dispatch(&self, bot: &Arc<Bot>, event: &Event) -> usize {
        let span = span!(Level::DEBUG, "dispatch", command = %event.command);
        let _enter = span.enter();

        // Snapshot so handlers may subscribe while being dispatched.
        let subscribers = match self.handlers.read().get(&event.command) {
            Some(list) => list.clone(),
            None => return 0,
        };

        subscribers
            .iter()
            .filter(|h| handler::invoke(h, bot, event, &event.command))
            .count()
    }

    /// Number of handlers subscribed to `verb`.
    pub fn subscriber_count(&self, verb: &str) -> usize {
        self.handlers
            .read()
            .get(&verb.to_ascii_uppercase())
            .map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for BasicMux {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let handlers = self.handlers.read();
        let mut verbs: Vec<_> = handlers.keys().collect();
        verbs.sort();
        f.debug_struct("BasicMux").field("verbs", &verbs).finish()
    }
}
