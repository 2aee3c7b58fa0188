//! Model compiler: flattens a model and its `extends` chain into one
//! name-unique attribute table.
//!
//! The table is built root ancestor first. A descendant entry replaces the
//! same-named inherited entry whole, keeping the inherited table position;
//! new names are appended. Each level resolves type names against its own
//! registry.

use indexmap::IndexMap;
use modelbind_core::RecordClass;
use tracing::debug;

use crate::error::Result;
use crate::normalize::{normalize_attribute, CompiledAttribute};
use crate::spec::ModelSpec;

/// Output of [`compile`]: the resolved record class and the flattened
/// attribute table in table order.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledModel {
    pub class: RecordClass,
    pub attributes: Vec<CompiledAttribute>,
}

impl CompiledModel {
    /// Looks up a compiled attribute by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&CompiledAttribute> {
        self.attributes.iter().find(|attr| attr.name == name)
    }
}

/// Compiles `model` into its class and attribute table.
///
/// `default_class` is used when neither the model nor any ancestor declares
/// a class. Compilation is a pure function of the model graph.
///
/// # Errors
///
/// Returns [`BindingError::InvalidSpec`](crate::BindingError::InvalidSpec)
/// for a nameless attribute entry anywhere in the chain, and
/// [`BindingError::UnsupportedMultipleInheritance`](crate::BindingError::UnsupportedMultipleInheritance)
/// for an `extends` list with more than one model.
pub fn compile(model: &ModelSpec, default_class: &RecordClass) -> Result<CompiledModel> {
    let mut table = IndexMap::new();
    collect_attributes(model, &mut table)?;
    let class = resolve_class(model, default_class)?;

    debug!(
        class = class.name(),
        attributes = table.len(),
        "compiled model"
    );

    Ok(CompiledModel {
        class,
        attributes: table.into_values().collect(),
    })
}

/// Resolves the record class: the nearest class declared along the
/// `extends` chain, else `default`.
///
/// # Errors
///
/// Returns [`BindingError::UnsupportedMultipleInheritance`](crate::BindingError::UnsupportedMultipleInheritance)
/// when the chain must be walked through an `extends` list of more than one
/// model.
pub fn resolve_class(model: &ModelSpec, default: &RecordClass) -> Result<RecordClass> {
    if let Some(class) = &model.class {
        return Ok(class.clone());
    }
    match model.parent()? {
        Some(parent) => resolve_class(parent, default),
        None => Ok(default.clone()),
    }
}

fn collect_attributes(
    model: &ModelSpec,
    table: &mut IndexMap<String, CompiledAttribute>,
) -> Result<()> {
    if let Some(parent) = model.parent()? {
        collect_attributes(parent, table)?;
    }
    for (hint, spec) in model.attributes.iter() {
        let attr = normalize_attribute(hint, spec, &model.types)?;
        // IndexMap::insert keeps the position of an existing key.
        table.insert(attr.name.clone(), attr);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use modelbind_core::{RecordKind, Value};
    use proptest::prelude::*;

    use super::*;
    use crate::error::BindingError;
    use crate::registry::DefaultValue;
    use crate::spec::AttributeDecl;

    fn names(compiled: &CompiledModel) -> Vec<&str> {
        compiled.attributes.iter().map(|a| a.name.as_str()).collect()
    }

    // ---- inheritance ----

    #[test]
    fn override_replaces_whole_entry() {
        let base = ModelSpec::new().attribute(
            "a",
            AttributeDecl::new().type_name("string").default_value("x").actor("john"),
        );
        let child = ModelSpec::new()
            .extends(base)
            .attribute("a", AttributeDecl::new().type_name("string").default_value("y"));

        let compiled = compile(&child, &RecordClass::state()).unwrap();
        let a = compiled.attribute("a").expect("compiled a");
        assert_eq!(a.name, "a");
        assert_eq!(a.attr_type.as_ref().map(|t| t.name.as_str()), Some("string"));
        assert_eq!(a.default, Some(DefaultValue::Static(Value::from("y"))));
        assert_eq!(a.actor, None);
        assert_eq!(compiled.attributes.len(), 1);
    }

    #[test]
    fn overridden_attribute_keeps_inherited_position() {
        let base = ModelSpec::new().attribute_names(["x", "y", "z"]);
        let child = ModelSpec::new()
            .extends(base)
            .attribute_names(["w"])
            .attribute("x", AttributeDecl::new().default_value(1));

        let compiled = compile(&child, &RecordClass::state()).unwrap();
        assert_eq!(names(&compiled), vec!["x", "y", "z", "w"]);
        assert!(compiled.attribute("x").and_then(|a| a.default.as_ref()).is_some());
    }

    #[test]
    fn three_level_chain_unions_attributes() {
        let root = ModelSpec::new().attribute("message", AttributeDecl::new().default_value("gello!"));
        let mid = ModelSpec::new().extends(root).attribute_names(["a"]);
        let leaf = ModelSpec::new().extends_all([mid]).attribute_names(["b"]);

        let compiled = compile(&leaf, &RecordClass::state()).unwrap();
        assert_eq!(names(&compiled), vec!["message", "a", "b"]);
    }

    #[test]
    fn multiple_inheritance_is_rejected() {
        let base = ModelSpec::new().attribute_names(["a"]);
        let model = ModelSpec::new().extends_all([base.clone(), base]);
        assert_eq!(
            compile(&model, &RecordClass::state()).unwrap_err(),
            BindingError::UnsupportedMultipleInheritance { count: 2 }
        );
    }

    #[test]
    fn invalid_entry_in_parent_fails_compile() {
        let base = ModelSpec::new().list_attribute(true);
        let model = ModelSpec::new().extends(base).attribute_names(["a"]);
        assert!(matches!(
            compile(&model, &RecordClass::state()),
            Err(BindingError::InvalidSpec { .. })
        ));
    }

    // ---- class resolution ----

    #[test]
    fn class_defaults_when_chain_declares_none() {
        let model = ModelSpec::new().attribute_names(["a"]);
        let compiled = compile(&model, &RecordClass::state()).unwrap();
        assert_eq!(compiled.class, RecordClass::state());
    }

    #[test]
    fn class_declared_mid_chain_is_inherited() {
        let custom = RecordClass::new("Custom", RecordKind::State);
        let other = RecordClass::new("Other", RecordKind::State);

        let root = ModelSpec::new();
        let mid = ModelSpec::new().extends(root).class(custom.clone());
        let leaf = ModelSpec::new().extends(mid.clone());
        let nearer = ModelSpec::new().extends(mid).class(other.clone());

        let state = RecordClass::state();
        assert_eq!(resolve_class(&leaf, &state).unwrap(), custom);
        assert_eq!(resolve_class(&nearer, &state).unwrap(), other);
    }

    // ---- properties ----

    fn name_sets() -> impl Strategy<Value = (Vec<String>, Vec<String>)> {
        let name = "[a-e]{1,2}";
        (
            prop::collection::vec(name, 0..6),
            prop::collection::vec(name, 0..6),
        )
    }

    proptest! {
        #[test]
        fn compile_is_idempotent((parent, child) in name_sets()) {
            let base = ModelSpec::new().attribute_names(parent);
            let model = ModelSpec::new().extends(base).attribute_names(child);

            let first = compile(&model, &RecordClass::state()).unwrap();
            let second = compile(&model, &RecordClass::state()).unwrap();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn child_entries_win_and_names_stay_unique((parent, child) in name_sets()) {
            let mut base = ModelSpec::new();
            for name in &parent {
                base = base.attribute(name.as_str(), AttributeDecl::new().default_value("parent"));
            }
            let mut model = ModelSpec::new().extends(base);
            for name in &child {
                model = model.attribute(name.as_str(), AttributeDecl::new().default_value("child"));
            }

            let compiled = compile(&model, &RecordClass::state()).unwrap();
            let mut expected: Vec<&String> = Vec::new();
            for name in parent.iter().chain(child.iter()) {
                if !expected.contains(&name) {
                    expected.push(name);
                }
            }
            prop_assert_eq!(compiled.attributes.len(), expected.len());
            for (attr, name) in compiled.attributes.iter().zip(expected) {
                prop_assert_eq!(&attr.name, name);
                let winner = if child.contains(name) { "child" } else { "parent" };
                prop_assert_eq!(
                    attr.default.clone(),
                    Some(DefaultValue::Static(Value::from(winner)))
                );
            }
        }
    }
}
