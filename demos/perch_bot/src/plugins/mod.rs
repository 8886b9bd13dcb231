//! Demo plugins.

pub mod dice;
pub mod echo;
pub mod karma;

use perch::framework::{PluginError, PluginRegistry};

/// Registers every demo plugin. Nothing is built until the runtime wires
/// the graph.
pub fn register_all(registry: &PluginRegistry) -> Result<(), PluginError> {
    dice::register(registry)?;
    karma::register(registry)?;
    echo::register(registry)?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use perch::core::Event;
    use perch::framework::plugin::builtin::register_builtins;
    use perch::framework::testing::test_host;
    use perch::framework::{BasicMux, Bot, ConfigSections, PluginRegistry};
    use tokio::sync::mpsc::UnboundedReceiver;

    pub struct Host {
        pub registry: Arc<PluginRegistry>,
        pub bot: Arc<Bot>,
        pub rx: UnboundedReceiver<String>,
    }

    impl Host {
        pub fn new(sections: ConfigSections) -> Self {
            let (registry, bot, rx) = test_host("bot", sections);
            register_builtins(&registry).unwrap();
            registry.resolve_each(perch::framework::plugin::builtin::BUILTIN_ORDER).unwrap();
            Self { registry, bot, rx }
        }

        pub fn feed(&self, line: &str) {
            let event: Event = line.parse().unwrap();
            self.registry.get::<BasicMux>().unwrap().dispatch(&self.bot, &event);
        }

        pub fn sent(&mut self) -> Vec<String> {
            let mut out = Vec::new();
            while let Ok(line) = self.rx.try_recv() {
                out.push(line);
            }
            out
        }
    }
}
