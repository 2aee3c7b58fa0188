//! Type registry: named type descriptors attribute specs may refer to.
//!
//! The registry is a passive lookup table. An attribute that names a type the
//! registry does not know is simply untyped; lookups never fail.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use modelbind_core::{ActorId, DeriveFn, State, Value};

/// Default for an attribute that the image does not supply.
#[derive(Clone)]
pub enum DefaultValue {
    /// Used as-is.
    Static(Value),
    /// Evaluated once per record (and actor scope) on first read.
    Generator(DeriveFn),
}

impl DefaultValue {
    /// Wraps a closure as a per-record generator.
    #[must_use]
    pub fn generator<F>(f: F) -> Self
    where
        F: Fn(&State, Option<&ActorId>) -> Option<Value> + Send + Sync + 'static,
    {
        Self::Generator(Arc::new(f))
    }

    #[must_use]
    pub fn is_generator(&self) -> bool {
        matches!(self, Self::Generator(_))
    }
}

impl PartialEq for DefaultValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Static(a), Self::Static(b)) => a == b,
            (Self::Generator(a), Self::Generator(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(value) => f.debug_tuple("Static").field(value).finish(),
            Self::Generator(_) => f.write_str("Generator(..)"),
        }
    }
}

impl From<Value> for DefaultValue {
    fn from(value: Value) -> Self {
        Self::Static(value)
    }
}

/// A named type an attribute can reference.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeDescriptor {
    pub default: Option<DefaultValue>,
}

impl TypeDescriptor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A type whose default is a static value.
    #[must_use]
    pub fn with_default(value: impl Into<Value>) -> Self {
        Self {
            default: Some(DefaultValue::Static(value.into())),
        }
    }

    /// A type whose default is generated per record.
    #[must_use]
    pub fn with_generator<F>(f: F) -> Self
    where
        F: Fn(&State, Option<&ActorId>) -> Option<Value> + Send + Sync + 'static,
    {
        Self {
            default: Some(DefaultValue::generator(f)),
        }
    }
}

/// Mapping from type name to [`TypeDescriptor`].
///
/// Read-only once built; safe to share across concurrent compilations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeRegistry {
    types: IndexMap<String, Arc<TypeDescriptor>>,
}

impl TypeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a type, builder style.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, descriptor: TypeDescriptor) -> Self {
        self.register(name, descriptor);
        self
    }

    pub fn register(&mut self, name: impl Into<String>, descriptor: TypeDescriptor) {
        self.types.insert(name.into(), Arc::new(descriptor));
    }

    /// Looks up a type by name. Unknown names yield `None`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<TypeDescriptor>> {
        self.types.get(name).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
