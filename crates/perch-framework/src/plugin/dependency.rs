//! Typed dependency declarations.
//!
//! A plugin factory declares what it needs through its argument type: `()`
//! for nothing, `Arc<T>` for a single dependency, or a tuple of `Arc<_>`s.
//! [`Dependencies::tokens`] reports the declared [`TypeToken`]s without
//! running the factory, which is what lets the registry validate and order
//! the graph up front.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::registry::PluginRegistry;
use crate::error::PluginError;

/// A resolved, type-erased plugin instance.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Identifies a provided or required type.
#[derive(Clone, Copy)]
pub struct TypeToken {
    id: TypeId,
    name: &'static str,
}

impl TypeToken {
    /// Token for `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The underlying [`TypeId`].
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Human-readable type name, for diagnostics only.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns `true` for the unit type, which never acts as a provider.
    pub fn is_unit(&self) -> bool {
        self.id == TypeId::of::<()>()
    }
}

impl PartialEq for TypeToken {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeToken {}

impl Hash for TypeToken {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeToken({})", self.name)
    }
}

impl fmt::Display for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A single injectable value.
pub trait Dependency: Sized + Send + 'static {
    /// The token this dependency is looked up by.
    fn token() -> TypeToken;

    /// Resolves the dependency on behalf of `requester`.
    fn fetch(registry: &PluginRegistry, requester: &str) -> Result<Self, PluginError>;
}

impl<T: Send + Sync + 'static> Dependency for Arc<T> {
    fn token() -> TypeToken {
        TypeToken::of::<T>()
    }

    fn fetch(registry: &PluginRegistry, requester: &str) -> Result<Self, PluginError> {
        registry.fetch::<T>(requester)
    }
}

/// The full argument of a plugin factory.
pub trait Dependencies: Sized + Send + 'static {
    /// Declared tokens, in argument order.
    fn tokens() -> Vec<TypeToken>;

    /// Resolves every dependency, in argument order.
    fn resolve(registry: &PluginRegistry, requester: &str) -> Result<Self, PluginError>;
}

impl Dependencies for () {
    fn tokens() -> Vec<TypeToken> {
        Vec::new()
    }

    fn resolve(_registry: &PluginRegistry, _requester: &str) -> Result<Self, PluginError> {
        Ok(())
    }
}

impl<T: Send + Sync + 'static> Dependencies for Arc<T> {
    fn tokens() -> Vec<TypeToken> {
        vec![<Self as Dependency>::token()]
    }

    fn resolve(registry: &PluginRegistry, requester: &str) -> Result<Self, PluginError> {
        <Self as Dependency>::fetch(registry, requester)
    }
}

macro_rules! impl_dependencies_for_tuple {
    ($($ty:ident),+) => {
        impl<$($ty: Dependency),+> Dependencies for ($($ty,)+) {
            fn tokens() -> Vec<TypeToken> {
                vec![$($ty::token()),+]
            }

            fn resolve(registry: &PluginRegistry, requester: &str) -> Result<Self, PluginError> {
                Ok(($($ty::fetch(registry, requester)?,)+))
            }
        }
    };
}

impl_dependencies_for_tuple!(A);
impl_dependencies_for_tuple!(A, B);
impl_dependencies_for_tuple!(A, B, C);
impl_dependencies_for_tuple!(A, B, C, D);
impl_dependencies_for_tuple!(A, B, C, D, E);
impl_dependencies_for_tuple!(A, B, C, D, E, F);
impl_dependencies_for_tuple!(A, B, C, D, E, F, G);
impl_dependencies_for_tuple!(A, B, C, D, E, F, G, H);

#[cfg(test)]
mod tests {
    use super::*;

    struct Alpha;
    struct Beta;

    #[test]
    fn test_tokens_follow_argument_order() {
        let tokens = <(Arc<Alpha>, Arc<Beta>)>::tokens();
        assert_eq!(tokens, vec![TypeToken::of::<Alpha>(), TypeToken::of::<Beta>()]);
        assert_eq!(<Arc<Beta>>::tokens(), vec![TypeToken::of::<Beta>()]);
        assert!(<()>::tokens().is_empty());
    }

    #[test]
    fn test_token_identity() {
        assert_eq!(TypeToken::of::<Alpha>(), TypeToken::of::<Alpha>());
        assert_ne!(TypeToken::of::<Alpha>(), TypeToken::of::<Beta>());
        assert!(TypeToken::of::<()>().is_unit());
        assert!(TypeToken::of::<Alpha>().name().ends_with("Alpha"));
    }
}
