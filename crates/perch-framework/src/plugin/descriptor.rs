//! Plugin descriptor — one registered plugin and its cached instance.

use std::fmt;
use std::sync::OnceLock;

use super::dependency::{Instance, TypeToken};
use super::registry::PluginRegistry;
use crate::error::PluginError;

/// Type-erased factory: resolves its own dependencies through the registry
/// and produces the instance.
pub(crate) type ErasedFactory =
    Box<dyn Fn(&PluginRegistry) -> Result<Instance, PluginError> + Send + Sync>;

/// A registered plugin.
///
/// Created by [`PluginRegistry::register`] or [`PluginRegistry::provide`];
/// the instance slot is filled exactly once, on the first successful
/// resolution, and is never cleared.
pub struct PluginDescriptor {
    name: String,
    provides: TypeToken,
    dependencies: Vec<TypeToken>,
    factory: ErasedFactory,
    instance: OnceLock<Instance>,
}

impl PluginDescriptor {
    pub(crate) fn new(
        name: String,
        provides: TypeToken,
        dependencies: Vec<TypeToken>,
        factory: ErasedFactory,
    ) -> Self {
        Self {
            name,
            provides,
            dependencies,
            factory,
            instance: OnceLock::new(),
        }
    }

    pub(crate) fn resolved(name: String, provides: TypeToken, instance: Instance) -> Self {
        let shared = Instance::clone(&instance);
        Self {
            name,
            provides,
            dependencies: Vec::new(),
            factory: Box::new(move |_| Ok(Instance::clone(&shared))),
            instance: OnceLock::from(instance),
        }
    }

    /// The unique plugin name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The type this plugin's instance has.
    pub fn provides(&self) -> TypeToken {
        self.provides
    }

    /// Declared dependencies, in factory argument order.
    pub fn dependencies(&self) -> &[TypeToken] {
        &self.dependencies
    }

    /// Returns `true` once the instance has been built.
    pub fn is_resolved(&self) -> bool {
        self.instance.get().is_some()
    }

    pub(crate) fn instance(&self) -> Option<Instance> {
        self.instance.get().cloned()
    }

    pub(crate) fn build(&self, registry: &PluginRegistry) -> Result<Instance, PluginError> {
        (self.factory)(registry)
    }

    /// Stores `instance` unless one is already cached; returns the cached one.
    pub(crate) fn cache(&self, instance: Instance) -> Instance {
        self.instance.get_or_init(|| instance).clone()
    }
}

impl fmt::Debug for PluginDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginDescriptor")
            .field("name", &self.name)
            .field("provides", &self.provides)
            .field("dependencies", &self.dependencies)
            .field("resolved", &self.is_resolved())
            .finish_non_exhaustive()
    }
}
