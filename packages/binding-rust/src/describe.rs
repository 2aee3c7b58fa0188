//! Describer: a serializable summary of a compiled model for tooling.

use modelbind_core::{ActorId, Value};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::compiler::compile;
use crate::config::BinderConfig;
use crate::error::Result;
use crate::normalize::CompiledAttribute;
use crate::registry::DefaultValue;
use crate::spec::ModelSpec;

/// Written in place of a generated default; functions are never serialized.
pub const DERIVED_MARKER: &str = "derived";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Descriptor {
    pub id: String,
    pub name: String,
    pub description: String,
    pub class: ClassDescriptor,
    pub attributes: Vec<AttributeDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassDescriptor {
    pub name: String,
}

/// One row of the compiled attribute table. Derivations are omitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeDescriptor {
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<ActorId>,
}

impl From<&CompiledAttribute> for AttributeDescriptor {
    fn from(attr: &CompiledAttribute) -> Self {
        let default = attr.default.as_ref().map(|default| match default {
            DefaultValue::Static(value) => value.clone(),
            DefaultValue::Generator(_) => Value::from(DERIVED_MARKER),
        });
        Self {
            name: attr.name.clone(),
            type_name: attr.attr_type.as_ref().map(|t| t.name.clone()),
            default,
            actor: attr.actor.clone(),
        }
    }
}

/// Describes `model`. A model without an `id` gets a fresh v4 UUID, so two
/// calls on such a model differ only in `id`.
///
/// # Errors
///
/// Fails with the compiler's errors.
pub fn describe(model: &ModelSpec, config: &BinderConfig) -> Result<Descriptor> {
    let compiled = compile(model, &config.state_class)?;
    let class_name = compiled.class.name().to_string();

    let descriptor = Descriptor {
        id: model
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        name: model
            .name
            .clone()
            .unwrap_or_else(|| format!("{class_name} {}", config.describe_suffix)),
        description: model
            .description
            .clone()
            .unwrap_or_else(|| config.default_description.clone()),
        class: ClassDescriptor { name: class_name },
        attributes: compiled.attributes.iter().map(AttributeDescriptor::from).collect(),
    };

    debug!(id = descriptor.id.as_str(), name = descriptor.name.as_str(), "described model");
    Ok(descriptor)
}
