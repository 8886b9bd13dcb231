//! Dependency-resolving plugin registry.
//!
//! [`PluginRegistry`] owns the mapping from plugin name to factory and
//! materialises the singleton object graph on demand:
//!
//! - [`register`](PluginRegistry::register) records a factory together with
//!   the dependency tokens its argument type declares. Nothing is built yet.
//! - [`resolve`](PluginRegistry::resolve) builds a plugin (and, recursively,
//!   everything it depends on) the first time it is asked for, then serves
//!   the cached `Arc` forever after.
//!
//! Dependencies are looked up by type: each registered plugin *provides* the
//! type its factory returns, and a factory taking `Arc<T>` receives the
//! instance of whichever plugin provides `T`. Factories returning `()` only
//! register handlers and are resolvable by name alone.
//!
//! # Example
//!
//! ```rust,ignore
//! let registry = Arc::new(PluginRegistry::new());
//! registry.register("store", |bot: Arc<Bot>| KarmaStore::from_config(&bot))?;
//! registry.register("karma", |(cmds, store): (Arc<CommandMux>, Arc<KarmaStore>)| {
//!     karma::install(&cmds, store)
//! })?;
//!
//! registry.resolve_all()?; // wires store before karma
//! ```
//!
//! # Resolution and locking
//!
//! Resolution is serialised by a re-entrant lock. The thread that holds it
//! may recurse freely (including through [`Bot::load_plugin`] from inside a
//! factory); other threads wait until the in-flight resolution finishes.
//! The lock also guards the in-progress chain used for cycle detection.
//!
//! [`Bot::load_plugin`]: crate::Bot::load_plugin

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{ReentrantMutex, RwLock};
use tracing::{debug, info};

use super::dependency::{Dependencies, Instance, TypeToken};
use super::descriptor::PluginDescriptor;
use crate::error::{BoxError, PluginError};

#[derive(Default)]
struct Catalog {
    /// Registration order.
    order: Vec<Arc<PluginDescriptor>>,
    by_name: HashMap<String, Arc<PluginDescriptor>>,
    /// Provided type → plugin name.
    providers: HashMap<TypeToken, String>,
}

/// Registry of plugin factories and their resolved singletons.
#[derive(Default)]
pub struct PluginRegistry {
    catalog: RwLock<Catalog>,
    resolving: ReentrantMutex<RefCell<Vec<String>>>,
}

impl PluginRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Registration ────────────────────────────────────────────────────────

    /// Registers a plugin factory under `name`.
    ///
    /// The factory's argument type declares its dependencies; its return
    /// type is what the plugin provides to others.
    ///
    /// # Errors
    ///
    /// - [`PluginError::DuplicateName`] if `name` is taken.
    /// - [`PluginError::InvalidFactory`] if the factory depends on the type
    ///   it provides, depends on `()`, or provides a type another plugin
    ///   already provides.
    pub fn register<D, T, E, F>(&self, name: impl Into<String>, factory: F) -> Result<(), PluginError>
    where
        D: Dependencies,
        T: Send + Sync + 'static,
        E: Into<BoxError>,
        F: Fn(D) -> Result<T, E> + Send + Sync + 'static,
    {
        let name = name.into();
        let provides = TypeToken::of::<T>();
        let dependencies = D::tokens();

        if let Some(token) = dependencies.iter().find(|t| t.is_unit()) {
            return Err(PluginError::invalid_factory(
                &name,
                format!("`{token}` cannot be declared as a dependency"),
            ));
        }
        if !provides.is_unit() && dependencies.contains(&provides) {
            return Err(PluginError::invalid_factory(
                &name,
                format!("factory depends on `{provides}`, the type it provides"),
            ));
        }

        let plugin = name.clone();
        let erased = Box::new(move |registry: &PluginRegistry| -> Result<Instance, PluginError> {
            let deps = D::resolve(registry, &plugin)?;
            let value = factory(deps).map_err(|e| PluginError::Factory {
                plugin: plugin.clone(),
                chain: registry.chain(),
                source: e.into(),
            })?;
            Ok(Arc::new(value) as Instance)
        });

        self.insert(PluginDescriptor::new(name, provides, dependencies, erased))
    }

    /// Registers an already-built instance under `name`.
    ///
    /// Used for the [`Bot`](crate::Bot) root and in tests.
    pub fn provide<T: Send + Sync + 'static>(
        &self,
        name: impl Into<String>,
        instance: Arc<T>,
    ) -> Result<(), PluginError> {
        let name = name.into();
        let provides = TypeToken::of::<T>();
        self.insert(PluginDescriptor::resolved(name, provides, instance))
    }

    fn insert(&self, descriptor: PluginDescriptor) -> Result<(), PluginError> {
        let mut catalog = self.catalog.write();
        let name = descriptor.name().to_string();
        let provides = descriptor.provides();

        if catalog.by_name.contains_key(&name) {
            return Err(PluginError::DuplicateName { name });
        }
        if !provides.is_unit()
            && let Some(existing) = catalog.providers.get(&provides)
        {
            return Err(PluginError::invalid_factory(
                &name,
                format!("`{provides}` is already provided by plugin '{existing}'"),
            ));
        }

        let descriptor = Arc::new(descriptor);
        if !provides.is_unit() {
            catalog.providers.insert(provides, name.clone());
        }
        catalog.order.push(Arc::clone(&descriptor));
        catalog.by_name.insert(name.clone(), descriptor);

        debug!(plugin = %name, provides = %provides, "Plugin registered");
        Ok(())
    }

    // ─── Resolution ──────────────────────────────────────────────────────────

    /// Resolves the plugin registered as `name`, building it and its
    /// dependencies on first use.
    pub fn resolve(&self, name: &str) -> Result<Instance, PluginError> {
        let descriptor = self
            .descriptor(name)
            .ok_or_else(|| PluginError::UnknownPlugin {
                name: name.to_string(),
            })?;
        if let Some(instance) = descriptor.instance() {
            return Ok(instance);
        }

        let stack = self.resolving.lock();
        // Another thread may have finished this plugin while we waited.
        if let Some(instance) = descriptor.instance() {
            return Ok(instance);
        }

        {
            let mut chain = stack.borrow_mut();
            if let Some(pos) = chain.iter().position(|n| n == name) {
                let mut cycle = chain[pos..].to_vec();
                cycle.push(name.to_string());
                return Err(PluginError::CyclicDependency { chain: cycle });
            }
            chain.push(name.to_string());
        }
        let entry = ChainEntry(&stack);

        debug!(plugin = %name, dependencies = ?descriptor.dependencies(), "Resolving plugin");
        let built = descriptor.build(self);
        drop(entry);

        let instance = descriptor.cache(built?);
        info!(plugin = %name, provides = %descriptor.provides(), "Plugin loaded");
        Ok(instance)
    }

    /// Resolves the plugin providing `T` and returns it with its concrete type.
    pub fn get<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, PluginError> {
        let token = TypeToken::of::<T>();
        let provider = self
            .provider_of(token)
            .ok_or(PluginError::UnknownProvider {
                dependency: token.name(),
            })?;
        let instance = self.resolve(&provider)?;
        downcast(instance, &provider)
    }

    /// Resolves a dependency of type `T` on behalf of `requester`.
    pub(crate) fn fetch<T: Send + Sync + 'static>(
        &self,
        requester: &str,
    ) -> Result<Arc<T>, PluginError> {
        let token = TypeToken::of::<T>();
        let Some(provider) = self.provider_of(token) else {
            return Err(PluginError::UnresolvedDependency {
                plugin: requester.to_string(),
                dependency: token.name(),
                chain: self.chain(),
            });
        };
        let instance = self.resolve(&provider)?;
        downcast(instance, &provider)
    }

    /// Resolves every registered plugin in registration order.
    ///
    /// Stops at the first failure; a partially wired graph must not be used.
    pub fn resolve_all(&self) -> Result<(), PluginError> {
        for name in self.names() {
            self.resolve(&name)?;
        }
        Ok(())
    }

    /// Resolves the named plugins, in the order given.
    pub fn resolve_each<I, S>(&self, names: I) -> Result<(), PluginError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.resolve(name.as_ref())?;
        }
        Ok(())
    }

    /// The current in-progress resolution chain, outermost first.
    pub(crate) fn chain(&self) -> Vec<String> {
        self.resolving.lock().borrow().clone()
    }

    // ─── Introspection ───────────────────────────────────────────────────────

    /// Returns the descriptor registered as `name`.
    pub fn descriptor(&self, name: &str) -> Option<Arc<PluginDescriptor>> {
        self.catalog.read().by_name.get(name).cloned()
    }

    /// Returns the name of the plugin providing `token`.
    pub fn provider_of(&self, token: TypeToken) -> Option<String> {
        self.catalog.read().providers.get(&token).cloned()
    }

    /// Registered plugin names, in registration order.
    pub fn names(&self) -> Vec<String> {
        self.catalog
            .read()
            .order
            .iter()
            .map(|d| d.name().to_string())
            .collect()
    }

    /// Returns `true` if `name` has been built.
    pub fn is_resolved(&self, name: &str) -> bool {
        self.descriptor(name).is_some_and(|d| d.is_resolved())
    }

    /// Number of registered plugins.
    pub fn len(&self) -> usize {
        self.catalog.read().order.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn downcast<T: Send + Sync + 'static>(instance: Instance, plugin: &str) -> Result<Arc<T>, PluginError> {
    instance
        .downcast::<T>()
        .map_err(|_| PluginError::TypeMismatch {
            plugin: plugin.to_string(),
            expected: std::any::type_name::<T>(),
        })
}

/// Pops the innermost chain entry when dropped, including during a panic
/// unwinding out of a factory.
struct ChainEntry<'a>(&'a RefCell<Vec<String>>);

impl Drop for ChainEntry<'_> {
    fn drop(&mut self) {
        self.0.borrow_mut().pop();
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.names())
            .finish_non_exhaustive()
    }
}
