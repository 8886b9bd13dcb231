//! Event handler types and isolated invocation.
//!
//! Every mux stores its handlers as [`BoxedHandler`]s: synchronous closures
//! that receive the shared [`Bot`] and the event being dispatched. Handlers
//! that need to do slow work spawn their own task and return immediately:
//!
//! ```rust,ignore
//! basic.subscribe("PRIVMSG", |bot, event| {
//!     let bot = Arc::clone(bot);
//!     let event = event.clone();
//!     tokio::spawn(async move {
//!         let title = fetch_title(event.trailing()).await;
//!         let _ = bot.reply(&event, title);
//!     });
//!     Ok(())
//! });
//! ```
//!
//! [`invoke`] runs a handler so that neither an `Err` nor a panic escapes
//! into the dispatch loop.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tracing::error;

use crate::bot::Bot;
use perch_core::Event;

/// Result returned by every handler.
pub type HandlerResult = anyhow::Result<()>;

/// A type-erased, shareable event handler.
pub type BoxedHandler = Arc<dyn Fn(&Arc<Bot>, &Event) -> HandlerResult + Send + Sync>;

/// Boxes a handler closure.
pub fn boxed<F>(handler: F) -> BoxedHandler
where
    F: Fn(&Arc<Bot>, &Event) -> HandlerResult + Send + Sync + 'static,
{
    Arc::new(handler)
}

/// Runs `handler`, containing any error or panic.
///
/// Failures are logged with the `route` that selected the handler (a verb,
/// command trigger or mention slot). Returns `true` when the handler
/// completed successfully.
pub fn invoke(handler: &BoxedHandler, bot: &Arc<Bot>, event: &Event, route: &str) -> bool {
    match catch_unwind(AssertUnwindSafe(|| handler(bot, event))) {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            error!(
                route = %route,
                command = %event.command,
                source = event.source_name().unwrap_or("-"),
                "Handler failed: {e:#}"
            );
            false
        }
        Err(payload) => {
            error!(
                route = %route,
                command = %event.command,
                "Handler panicked: {}",
                panic_message(payload.as_ref())
            );
            false
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_bot;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn event() -> Event {
        ":belak PRIVMSG #perch :hi".parse().unwrap()
    }

    #[test]
    fn test_invoke_success() {
        let (bot, _rx) = test_bot("bot");
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let handler = boxed(move |_, _| {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        assert!(invoke(&handler, &bot, &event(), "test"));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_invoke_contains_error() {
        let (bot, _rx) = test_bot("bot");
        let handler = boxed(|_, _| anyhow::bail!("boom"));
        assert!(!invoke(&handler, &bot, &event(), "test"));
    }

    #[test]
    fn test_invoke_contains_panic() {
        let (bot, _rx) = test_bot("bot");
        let handler = boxed(|_, _| panic!("handler exploded"));
        assert!(!invoke(&handler, &bot, &event(), "test"));
    }

    #[tokio::test]
    async fn test_handler_spawns_detached_work() {
        let (bot, mut rx) = test_bot("bot");
        let handler = boxed(|bot, event| {
            let bot = Arc::clone(bot);
            let event = event.clone();
            tokio::spawn(async move {
                let _ = bot.reply(&event, "later");
            });
            Ok(())
        });

        assert!(invoke(&handler, &bot, &event(), "test"));
        assert_eq!(rx.recv().await.unwrap(), "PRIVMSG #perch :later");
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(payload.as_ref()), "static");
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");
        let payload: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }
}
