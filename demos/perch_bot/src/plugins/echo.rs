//! A private-only `echo` command.

use std::sync::Arc;

use perch::framework::{CommandMux, HelpInfo, PluginError, PluginRegistry};

/// Plugin name.
pub const NAME: &str = "echo";

pub fn register(registry: &PluginRegistry) -> Result<(), PluginError> {
    registry.register(NAME, |cmds: Arc<CommandMux>| {
        cmds.private(
            NAME,
            |bot, event| Ok(bot.reply(event, event.trailing())?),
            Some(HelpInfo::new("<text>", "Repeats text back to you")),
        )
    })
}
