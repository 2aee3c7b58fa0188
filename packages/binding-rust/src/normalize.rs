//! Spec normalization: one raw entry in, one canonical descriptor out.
//!
//! [`normalize_attribute`] turns any [`AttributeSpec`] shape into a
//! [`CompiledAttribute`]; [`normalize_projection`] turns any
//! [`ProjectionSpec`] shape into a [`ProjectionRule`]. Neither recurses; the
//! compiler and projector walk the inheritance chain around them.

use std::fmt;
use std::sync::Arc;

use modelbind_core::{ActorId, DeriveFn};

use crate::error::{BindingError, Result};
use crate::registry::{DefaultValue, TypeDescriptor, TypeRegistry};
use crate::spec::{AttributeSpec, MapFn, ProjectionSpec, ReduceFn, Source};

// ---------------------------------------------------------------------------
// Attributes
// ---------------------------------------------------------------------------

/// Type reference carried by a compiled attribute.
///
/// The name is kept as written. The descriptor is present only when the name
/// was found in the model's type registry.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeType {
    pub name: String,
    pub descriptor: Option<Arc<TypeDescriptor>>,
}

impl AttributeType {
    fn resolve(name: &str, types: &TypeRegistry) -> Self {
        let descriptor = types.get(name);
        if descriptor.is_none() {
            tracing::trace!(type_name = name, "type not registered, attribute stays untyped");
        }
        Self {
            name: name.to_string(),
            descriptor,
        }
    }
}

/// Canonical attribute descriptor produced by normalization.
#[derive(Clone)]
pub struct CompiledAttribute {
    pub name: String,
    pub attr_type: Option<AttributeType>,
    pub default: Option<DefaultValue>,
    pub derive: Option<DeriveFn>,
    pub actor: Option<ActorId>,
}

impl CompiledAttribute {
    /// An attribute with only a name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attr_type: None,
            default: None,
            derive: None,
            actor: None,
        }
    }

    /// The default applied when the image lacks this attribute: the
    /// attribute's own default, else its registered type's default.
    #[must_use]
    pub fn effective_default(&self) -> Option<&DefaultValue> {
        self.default.as_ref().or_else(|| {
            self.attr_type
                .as_ref()
                .and_then(|t| t.descriptor.as_deref())
                .and_then(|d| d.default.as_ref())
        })
    }
}

impl PartialEq for CompiledAttribute {
    fn eq(&self, other: &Self) -> bool {
        let same_derive = match (&self.derive, &other.derive) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        self.name == other.name
            && self.attr_type == other.attr_type
            && self.default == other.default
            && same_derive
            && self.actor == other.actor
    }
}

impl fmt::Debug for CompiledAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledAttribute")
            .field("name", &self.name)
            .field("attr_type", &self.attr_type.as_ref().map(|t| &t.name))
            .field("default", &self.default)
            .field("derive", &self.derive.is_some())
            .field("actor", &self.actor)
            .finish()
    }
}

/// Normalizes one attribute entry.
///
/// `hint` is the map-form key, if the entry had one.
///
/// # Errors
///
/// Returns [`BindingError::InvalidSpec`] when neither the hint nor the entry
/// itself yields a name.
pub fn normalize_attribute(
    hint: Option<&str>,
    spec: &AttributeSpec,
    types: &TypeRegistry,
) -> Result<CompiledAttribute> {
    let missing_name = || BindingError::InvalidSpec {
        context: format!("{} attribute entry without a name", spec.shape()),
    };

    let compiled = match spec {
        AttributeSpec::Name(value) => match hint {
            Some(name) => CompiledAttribute {
                attr_type: Some(AttributeType::resolve(value, types)),
                ..CompiledAttribute::named(name)
            },
            None => CompiledAttribute::named(value.as_str()),
        },
        AttributeSpec::Flag => CompiledAttribute::named(hint.ok_or_else(missing_name)?),
        AttributeSpec::Derive(f) => CompiledAttribute {
            derive: Some(f.clone()),
            ..CompiledAttribute::named(hint.ok_or_else(missing_name)?)
        },
        AttributeSpec::Full(decl) => {
            let name = decl.name.as_deref().or(hint).ok_or_else(missing_name)?;
            CompiledAttribute {
                name: name.to_string(),
                attr_type: decl
                    .type_name
                    .as_deref()
                    .map(|type_name| AttributeType::resolve(type_name, types)),
                default: decl.default.clone(),
                derive: decl.derive.clone(),
                actor: decl.actor.clone(),
            }
        }
    };

    Ok(compiled)
}

// ---------------------------------------------------------------------------
// Projections
// ---------------------------------------------------------------------------

/// How a projected attribute is computed from the source record.
#[derive(Clone)]
pub enum Combinator {
    /// Read the same-named source attribute.
    Reflect,
    /// Read another source attribute.
    Alias { source: String },
    /// Transform one source attribute.
    Map { source: String, f: MapFn },
    /// Combine a keyed snapshot of several source attributes. Without a
    /// transform the snapshot itself becomes the value.
    Reduce {
        sources: Vec<String>,
        f: Option<ReduceFn>,
    },
}

impl fmt::Debug for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reflect => f.write_str("Reflect"),
            Self::Alias { source } => f.debug_struct("Alias").field("source", source).finish(),
            Self::Map { source, .. } => f.debug_struct("Map").field("source", source).finish(),
            Self::Reduce { sources, f: transform } => f
                .debug_struct("Reduce")
                .field("sources", sources)
                .field("f", &transform.is_some())
                .finish(),
        }
    }
}

/// A normalized projection entry: target name, combinator, and the actor
/// scope the target is registered under.
#[derive(Debug, Clone)]
pub struct ProjectionRule {
    pub target: String,
    pub combinator: Combinator,
    pub actor: Option<ActorId>,
}

/// Normalizes one projection entry.
///
/// In list form (`target` is `None`) only a string entry is meaningful: it
/// names the attribute to reflect.
///
/// # Errors
///
/// Returns [`BindingError::InvalidSpec`] when no target name can be derived.
pub fn normalize_projection(target: Option<&str>, spec: &ProjectionSpec) -> Result<ProjectionRule> {
    let Some(target) = target else {
        return match spec {
            ProjectionSpec::Alias(name) => Ok(ProjectionRule {
                target: name.clone(),
                combinator: Combinator::Reflect,
                actor: None,
            }),
            other => Err(BindingError::InvalidSpec {
                context: format!("{} projection entry without a target", other.shape()),
            }),
        };
    };

    let (combinator, actor) = match spec {
        ProjectionSpec::Reflect => (Combinator::Reflect, None),
        ProjectionSpec::Alias(source) => (
            Combinator::Alias {
                source: source.clone(),
            },
            None,
        ),
        ProjectionSpec::Map(f) => (
            Combinator::Map {
                source: target.to_string(),
                f: f.clone(),
            },
            None,
        ),
        ProjectionSpec::Full(decl) => {
            let combinator = match &decl.source {
                Some(Source::Many(sources)) => Combinator::Reduce {
                    sources: sources.clone(),
                    f: decl.reduce.clone(),
                },
                one => {
                    let source = match one {
                        Some(Source::One(source)) => source.clone(),
                        _ => target.to_string(),
                    };
                    match &decl.map {
                        Some(f) => Combinator::Map { source, f: f.clone() },
                        None => Combinator::Alias { source },
                    }
                }
            };
            (combinator, decl.actor.clone())
        }
    };

    Ok(ProjectionRule {
        target: target.to_string(),
        combinator,
        actor,
    })
}
