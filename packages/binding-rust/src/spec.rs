//! Author-facing model declarations.
//!
//! A [`ModelSpec`] is the loosely shaped input the compiler consumes. Each
//! attribute and projection entry may take one of several shapes, captured
//! here as explicit unions ([`AttributeSpec`], [`ProjectionSpec`]) rather than
//! inspected at runtime.
//!
//! Entries live in [`Declarations`], which covers both the list form (entries
//! carry no key; the name must come from the entry itself) and the map form
//! (the key names the attribute or projection target).

use std::fmt;
use std::sync::Arc;

use modelbind_core::{ActorId, DeriveFn, RecordClass, Snapshot, State, Value};

use crate::error::{BindingError, Result};
use crate::registry::{DefaultValue, TypeRegistry};

/// Single-argument transform applied by a map projection.
pub type MapFn = Arc<dyn Fn(Option<Value>) -> Option<Value> + Send + Sync>;

/// Transform applied by a reduce projection to a keyed snapshot of its sources.
pub type ReduceFn = Arc<dyn Fn(&Snapshot) -> Option<Value> + Send + Sync>;

// ---------------------------------------------------------------------------
// Declarations
// ---------------------------------------------------------------------------

/// Ordered attribute or projection entries, in list or map form.
///
/// Declaration order is preserved. Keyed and unkeyed entries may be mixed;
/// the key, when present, is the name hint handed to the normalizer.
#[derive(Clone)]
pub struct Declarations<T> {
    entries: Vec<(Option<String>, T)>,
}

impl<T> Declarations<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// List form: entries without keys.
    #[must_use]
    pub fn list(entries: impl IntoIterator<Item = T>) -> Self {
        Self {
            entries: entries.into_iter().map(|spec| (None, spec)).collect(),
        }
    }

    /// Map form: each entry keyed by its name.
    #[must_use]
    pub fn keyed<K: Into<String>>(entries: impl IntoIterator<Item = (K, T)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(key, spec)| (Some(key.into()), spec))
                .collect(),
        }
    }

    pub fn push(&mut self, spec: T) {
        self.entries.push((None, spec));
    }

    pub fn insert(&mut self, key: impl Into<String>, spec: T) {
        self.entries.push((Some(key.into()), spec));
    }

    /// Iterates entries in declaration order as `(key, spec)`.
    pub fn iter(&self) -> impl Iterator<Item = (Option<&str>, &T)> {
        self.entries
            .iter()
            .map(|(key, spec)| (key.as_deref(), spec))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for Declarations<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for Declarations<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.iter()).finish()
    }
}

// ---------------------------------------------------------------------------
// Attributes
// ---------------------------------------------------------------------------

/// One raw attribute entry.
#[derive(Clone)]
pub enum AttributeSpec {
    /// In list form, the attribute name. In map form, a type-registry name.
    Name(String),
    /// The attribute exists; no type, no default.
    Flag,
    /// The attribute is computed lazily from the record.
    Derive(DeriveFn),
    /// Full declaration.
    Full(AttributeDecl),
}

impl AttributeSpec {
    /// Derivation shape: the attribute is computed from the record on first read.
    #[must_use]
    pub fn derive<F>(f: F) -> Self
    where
        F: Fn(&State, Option<&ActorId>) -> Option<Value> + Send + Sync + 'static,
    {
        Self::Derive(Arc::new(f))
    }

    pub(crate) fn shape(&self) -> &'static str {
        match self {
            Self::Name(_) => "string",
            Self::Flag => "boolean",
            Self::Derive(_) => "function",
            Self::Full(_) => "object",
        }
    }
}

impl fmt::Debug for AttributeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.debug_tuple("Name").field(name).finish(),
            Self::Flag => f.write_str("Flag"),
            Self::Derive(_) => f.write_str("Derive(..)"),
            Self::Full(decl) => f.debug_tuple("Full").field(decl).finish(),
        }
    }
}

impl From<&str> for AttributeSpec {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for AttributeSpec {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<bool> for AttributeSpec {
    fn from(_: bool) -> Self {
        Self::Flag
    }
}

impl From<AttributeDecl> for AttributeSpec {
    fn from(decl: AttributeDecl) -> Self {
        Self::Full(decl)
    }
}

/// Full attribute declaration: `{ name?, type?, default?, derive?, actor? }`.
#[derive(Clone, Default)]
pub struct AttributeDecl {
    pub name: Option<String>,
    pub type_name: Option<String>,
    pub default: Option<DefaultValue>,
    pub derive: Option<DeriveFn>,
    pub actor: Option<ActorId>,
}

impl AttributeDecl {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Static(value.into()));
        self
    }

    #[must_use]
    pub fn default_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&State, Option<&ActorId>) -> Option<Value> + Send + Sync + 'static,
    {
        self.default = Some(DefaultValue::generator(f));
        self
    }

    #[must_use]
    pub fn derive<F>(mut self, f: F) -> Self
    where
        F: Fn(&State, Option<&ActorId>) -> Option<Value> + Send + Sync + 'static,
    {
        self.derive = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn actor(mut self, actor: impl Into<ActorId>) -> Self {
        self.actor = Some(actor.into());
        self
    }
}

impl fmt::Debug for AttributeDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeDecl")
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("default", &self.default)
            .field("derive", &self.derive.is_some())
            .field("actor", &self.actor)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Projections
// ---------------------------------------------------------------------------

/// One raw projection entry.
#[derive(Clone)]
pub enum ProjectionSpec {
    /// Target reads the same-named source attribute.
    Reflect,
    /// Target reads the named source attribute.
    Alias(String),
    /// Target is a transform of the same-named source attribute.
    Map(MapFn),
    /// Full declaration.
    Full(ProjectionDecl),
}

impl ProjectionSpec {
    /// Condensed map shape over the same-named source attribute.
    #[must_use]
    pub fn map<F>(f: F) -> Self
    where
        F: Fn(Option<Value>) -> Option<Value> + Send + Sync + 'static,
    {
        Self::Map(Arc::new(f))
    }

    pub(crate) fn shape(&self) -> &'static str {
        match self {
            Self::Reflect => "boolean",
            Self::Alias(_) => "string",
            Self::Map(_) => "function",
            Self::Full(_) => "object",
        }
    }
}

impl fmt::Debug for ProjectionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reflect => f.write_str("Reflect"),
            Self::Alias(source) => f.debug_tuple("Alias").field(source).finish(),
            Self::Map(_) => f.write_str("Map(..)"),
            Self::Full(decl) => f.debug_tuple("Full").field(decl).finish(),
        }
    }
}

impl From<bool> for ProjectionSpec {
    fn from(_: bool) -> Self {
        Self::Reflect
    }
}

impl From<&str> for ProjectionSpec {
    fn from(source: &str) -> Self {
        Self::Alias(source.to_string())
    }
}

impl From<String> for ProjectionSpec {
    fn from(source: String) -> Self {
        Self::Alias(source)
    }
}

impl From<ProjectionDecl> for ProjectionSpec {
    fn from(decl: ProjectionDecl) -> Self {
        Self::Full(decl)
    }
}

/// Where a full projection reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// A single source attribute (map or alias).
    One(String),
    /// An ordered set of source attributes (reduce).
    Many(Vec<String>),
}

/// Full projection declaration: `{ source?, map | reduce, actor? }`.
#[derive(Clone, Default)]
pub struct ProjectionDecl {
    pub source: Option<Source>,
    pub map: Option<MapFn>,
    pub reduce: Option<ReduceFn>,
    pub actor: Option<ActorId>,
}

impl ProjectionDecl {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(Source::One(source.into()));
        self
    }

    #[must_use]
    pub fn sources<S: Into<String>>(mut self, sources: impl IntoIterator<Item = S>) -> Self {
        self.source = Some(Source::Many(sources.into_iter().map(Into::into).collect()));
        self
    }

    #[must_use]
    pub fn map<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<Value>) -> Option<Value> + Send + Sync + 'static,
    {
        self.map = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn reduce<F>(mut self, f: F) -> Self
    where
        F: Fn(&Snapshot) -> Option<Value> + Send + Sync + 'static,
    {
        self.reduce = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn actor(mut self, actor: impl Into<ActorId>) -> Self {
        self.actor = Some(actor.into());
        self
    }
}

impl fmt::Debug for ProjectionDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectionDecl")
            .field("source", &self.source)
            .field("map", &self.map.is_some())
            .field("reduce", &self.reduce.is_some())
            .field("actor", &self.actor)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Models
// ---------------------------------------------------------------------------

/// Parent declaration of a model.
#[derive(Debug, Clone)]
pub enum Extends {
    One(Arc<ModelSpec>),
    /// List form. Only zero or one entries are supported.
    Many(Vec<Arc<ModelSpec>>),
}

impl Extends {
    /// The single parent, if any.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::UnsupportedMultipleInheritance`] when the list
    /// form names more than one model.
    pub fn parent(&self) -> Result<Option<&ModelSpec>> {
        match self {
            Self::One(parent) => Ok(Some(&**parent)),
            Self::Many(parents) if parents.len() > 1 => {
                Err(BindingError::UnsupportedMultipleInheritance {
                    count: parents.len(),
                })
            }
            Self::Many(parents) => Ok(parents.first().map(|parent| &**parent)),
        }
    }
}

/// A declarative model: attributes, projections, class, and parent.
///
/// Models are immutable inputs; the compiler never mutates them.
///
/// # Examples
///
/// ```
/// use modelbind::{AttributeDecl, ModelSpec};
///
/// let base = ModelSpec::new().attribute("message", AttributeDecl::new().default_value("gello!"));
/// let model = ModelSpec::new().extends(base).attribute_names(["a"]);
///
/// assert_eq!(model.attributes.len(), 1);
/// assert!(model.parent().unwrap().is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ModelSpec {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub class: Option<RecordClass>,
    pub extends: Option<Extends>,
    pub attributes: Declarations<AttributeSpec>,
    pub projections: Declarations<ProjectionSpec>,
    pub types: TypeRegistry,
}

impl ModelSpec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn class(mut self, class: RecordClass) -> Self {
        self.class = Some(class);
        self
    }

    /// Declares the single parent model.
    #[must_use]
    pub fn extends(mut self, parent: impl Into<Arc<ModelSpec>>) -> Self {
        self.extends = Some(Extends::One(parent.into()));
        self
    }

    /// Declares parents in list form. More than one parent fails to compile.
    #[must_use]
    pub fn extends_all<P: Into<Arc<ModelSpec>>>(mut self, parents: impl IntoIterator<Item = P>) -> Self {
        self.extends = Some(Extends::Many(parents.into_iter().map(Into::into).collect()));
        self
    }

    #[must_use]
    pub fn types(mut self, types: TypeRegistry) -> Self {
        self.types = types;
        self
    }

    /// Adds a map-form attribute entry keyed by `name`.
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, spec: impl Into<AttributeSpec>) -> Self {
        self.attributes.insert(name, spec.into());
        self
    }

    /// Adds a list-form attribute entry; the entry must carry its own name.
    #[must_use]
    pub fn list_attribute(mut self, spec: impl Into<AttributeSpec>) -> Self {
        self.attributes.push(spec.into());
        self
    }

    /// Adds list-form attributes by name.
    #[must_use]
    pub fn attribute_names<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        for name in names {
            self.attributes.push(AttributeSpec::Name(name.into()));
        }
        self
    }

    /// Adds a map-form projection entry for `target`.
    #[must_use]
    pub fn projection(mut self, target: impl Into<String>, spec: impl Into<ProjectionSpec>) -> Self {
        self.projections.insert(target, spec.into());
        self
    }

    /// Adds list-form projections, each reflecting the named source attribute.
    #[must_use]
    pub fn projection_names<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        for name in names {
            self.projections.push(ProjectionSpec::Alias(name.into()));
        }
        self
    }

    /// The single parent model, if any.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::UnsupportedMultipleInheritance`] for a list
    /// of more than one parent.
    pub fn parent(&self) -> Result<Option<&ModelSpec>> {
        match &self.extends {
            Some(extends) => extends.parent(),
            None => Ok(None),
        }
    }
}
