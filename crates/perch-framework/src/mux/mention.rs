//! Passive handlers that see every message.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{Level, span};

use super::basic::BasicMux;
use super::help::HelpInfo;
use crate::bot::Bot;
use crate::handler::{self, BoxedHandler, HandlerResult};
use perch_core::{Event, verb};

struct MentionEntry {
    handler: BoxedHandler,
    hint: Option<HelpInfo>,
}

#[derive(Default)]
struct MentionInner {
    handlers: RwLock<Vec<MentionEntry>>,
}

/// Runs every registered handler on every `PRIVMSG`.
///
/// Mention handlers do their own matching, typically with a regex over the
/// trailing text, and stay quiet when nothing matches. Cloning is cheap;
/// clones share the same handler list.
#[derive(Clone, Default)]
pub struct MentionMux {
    inner: Arc<MentionInner>,
}

impl MentionMux {
    /// Creates a mux with no handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler`, with an optional hint describing what it reacts to.
    pub fn event<F>(&self, handler: F, hint: Option<HelpInfo>)
    where
        F: Fn(&Arc<Bot>, &Event) -> HandlerResult + Send + Sync + 'static,
    {
        self.inner.handlers.write().push(MentionEntry {
            handler: handler::boxed(handler),
            hint,
        });
    }

    /// Hints of every handler registered with one, in registration order.
    pub fn hints(&self) -> Vec<HelpInfo> {
        self.inner
            .handlers
            .read()
            .iter()
            .filter_map(|m| m.hint.clone())
            .collect()
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.inner.handlers.read().len()
    }

    /// Returns `true` if no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Subscribes this mux to `PRIVMSG` events on `basic`.
    pub fn attach(&self, basic: &BasicMux) {
        let mux = self.clone();
        basic.subscribe(verb::PRIVMSG, move |bot, event| {
            mux.dispatch(bot, event);
            Ok(())
        });
    }

    /// Runs every handler on `event` if it is a `PRIVMSG`.
    ///
    /// Returns the number of handlers that completed successfully.
    pub fn dispatch(&self, bot: &Arc<Bot>, event: &Event) -> usize {
        if event.command != verb::PRIVMSG {
            return 0;
        }
        let span = span!(Level::DEBUG, "mention");
        let _enter = span.enter();

        let handlers: Vec<BoxedHandler> = self
            .inner
            .handlers
            .read()
            .iter()
            .map(|m| BoxedHandler::clone(&m.handler))
            .collect();

        handlers
            .iter()
            .enumerate()
            .filter(|(slot, h)| handler::invoke(h, bot, event, &format!("mention#{slot}")))
            .count()
    }
}

impl std::fmt::Debug for MentionMux {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MentionMux")
            .field("handlers", &self.len())
            .finish()
    }
}
