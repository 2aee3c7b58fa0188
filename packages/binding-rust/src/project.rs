//! Projector: builds read-only views whose attributes are computed from a
//! source record.
//!
//! Every projection is registered as a live binding, so a view always reads
//! through to the current state of its source. Plain attributes declared on
//! a projection model are bound afterwards, with an empty image, and may
//! read the projected attributes.

use std::sync::Arc;

use modelbind_core::{ActorId, BindFn, Image, Record, RecordClass, Snapshot, State, Value};
use tracing::{debug, trace};

use crate::compiler::compile;
use crate::config::BinderConfig;
use crate::error::Result;
use crate::materialize::bind_attributes;
use crate::normalize::{normalize_projection, Combinator, ProjectionRule};
use crate::spec::ModelSpec;

impl ProjectionRule {
    /// Registers this rule on `view` under its target and actor scope.
    pub fn register(&self, view: &State) {
        trace!(
            target_name = self.target.as_str(),
            combinator = ?self.combinator,
            class = view.class_name(),
            "registering projection"
        );
        view.bind(&self.target, self.binding(), self.actor.as_ref());
    }

    fn binding(&self) -> BindFn {
        match &self.combinator {
            Combinator::Reflect => {
                let name = self.target.clone();
                Arc::new(move |src: Option<&State>, actor: Option<&ActorId>| src?.get(&name, actor))
            }
            Combinator::Alias { source } => {
                let source = source.clone();
                Arc::new(move |src: Option<&State>, actor: Option<&ActorId>| {
                    src?.get(&source, actor)
                })
            }
            Combinator::Map { source, f } => {
                let source = source.clone();
                let f = f.clone();
                Arc::new(move |src: Option<&State>, actor: Option<&ActorId>| {
                    f(src?.get(&source, actor))
                })
            }
            Combinator::Reduce { sources, f } => {
                let sources = sources.clone();
                let f = f.clone();
                // Sources are read unscoped, whatever actor the view is read for.
                Arc::new(move |src: Option<&State>, _: Option<&ActorId>| {
                    let src = src?;
                    let snapshot: Snapshot = sources
                        .iter()
                        .filter_map(|name| Some((name.clone(), src.get(name, None)?)))
                        .collect();
                    match &f {
                        Some(f) => f(&snapshot),
                        None => Some(Value::Map(snapshot)),
                    }
                })
            }
        }
    }
}

/// Normalizes every projection along the `extends` chain, root ancestor
/// first, without touching any record.
///
/// # Errors
///
/// Returns [`BindingError::InvalidSpec`](crate::BindingError::InvalidSpec)
/// for a projection entry without a target and
/// [`BindingError::UnsupportedMultipleInheritance`](crate::BindingError::UnsupportedMultipleInheritance)
/// for an `extends` list of more than one model.
pub fn compile_projections(model: &ModelSpec) -> Result<Vec<ProjectionRule>> {
    let mut rules = match model.parent()? {
        Some(parent) => compile_projections(parent)?,
        None => Vec::new(),
    };
    for (target, spec) in model.projections.iter() {
        rules.push(normalize_projection(target, spec)?);
    }
    Ok(rules)
}

/// Builds a view over `source`, shaped by `model`.
///
/// Without a model the view is empty. `class` overrides the class resolved
/// from the model chain, which defaults to the configured projection class.
///
/// # Errors
///
/// Fails before the view is constructed if any attribute or projection in
/// the chain is invalid.
pub fn project(
    source: Option<Arc<State>>,
    model: Option<&ModelSpec>,
    class: Option<&RecordClass>,
    config: &BinderConfig,
) -> Result<State> {
    let Some(model) = model else {
        let class = class.unwrap_or(&config.projection_class);
        debug!(class = class.name(), "projected untyped view");
        return Ok(State::view(class, source));
    };

    let compiled = compile(model, &config.projection_class)?;
    let rules = compile_projections(model)?;
    let class = class.unwrap_or(&compiled.class);

    let view = State::view(class, source);
    for rule in &rules {
        rule.register(&view);
    }
    bind_attributes(&Image::new(), &view, &compiled.attributes);

    debug!(
        class = class.name(),
        projections = rules.len(),
        attributes = compiled.attributes.len(),
        "projected view"
    );
    Ok(view)
}

#[cfg(test)]
mod tests {
    use modelbind_core::RecordKind;

    use super::*;
    use crate::error::BindingError;
    use crate::spec::{AttributeDecl, AttributeSpec, ProjectionDecl, ProjectionSpec};

    fn source(entries: &[(&str, Value)]) -> Arc<State> {
        let image: Image = entries
            .iter()
            .map(|(name, value)| ((*name).to_string(), value.clone()))
            .collect();
        Arc::new(State::from_image(&RecordClass::state(), &image))
    }

    fn config() -> BinderConfig {
        BinderConfig::default()
    }

    fn john() -> ActorId {
        ActorId::new("john")
    }

    // ---- combinators ----

    #[test]
    fn reflect_alias_and_map() {
        let src = source(&[("a", Value::Int(100)), ("c", Value::from("hi"))]);
        let model = ModelSpec::new()
            .projection("a", true)
            .projection("b", "a")
            .projection("c", ProjectionSpec::map(|v| Some(Value::from(format!("{}!", v?.as_str()?)))))
            .projection(
                "d",
                ProjectionDecl::new().source("a").map(|v| Some(Value::Int(v?.as_int()? + 1))),
            );

        let view = project(Some(src), Some(&model), None, &config()).unwrap();
        assert_eq!(view.class_name(), "Projection");
        assert_eq!(view.get("a", None), Some(Value::Int(100)));
        assert_eq!(view.get("b", None), Some(Value::Int(100)));
        assert_eq!(view.get("c", None), Some(Value::from("hi!")));
        assert_eq!(view.get("d", None), Some(Value::Int(101)));
    }

    #[test]
    fn reduce_receives_keyed_snapshot() {
        let src = source(&[("a", Value::Int(100)), ("n", Value::Int(300))]);
        let model = ModelSpec::new().projection(
            "b",
            ProjectionDecl::new().sources(["a", "n"]).reduce(|values| {
                let a = values.get("a")?.as_int()?;
                let n = values.get("n")?.as_int()?;
                Some(Value::Int(n - a))
            }),
        );
        let view = project(Some(src), Some(&model), None, &config()).unwrap();
        assert_eq!(view.get("b", None), Some(Value::Int(200)));
    }

    #[test]
    fn reduce_without_transform_yields_sources() {
        let src = source(&[("a", Value::Int(1))]);
        let model = ModelSpec::new().projection("both", ProjectionDecl::new().sources(["a", "missing"]));
        let view = project(Some(src), Some(&model), None, &config()).unwrap();

        let mut expected = Snapshot::new();
        expected.insert("a".to_string(), Value::Int(1));
        assert_eq!(view.get("both", None), Some(Value::Map(expected)));
    }

    #[test]
    fn missing_source_value_flows_through_map() {
        let src = source(&[]);
        let model = ModelSpec::new()
            .projection("x", ProjectionSpec::map(|v| Some(Value::Bool(v.is_none()))))
            .projection("y", "nothing");
        let view = project(Some(src), Some(&model), None, &config()).unwrap();
        assert_eq!(view.get("x", None), Some(Value::Bool(true)));
        assert_eq!(view.get("y", None), None);
    }

    #[test]
    fn view_tracks_source_changes() {
        let src = source(&[("a", Value::Int(1))]);
        let model = ModelSpec::new().projection_names(["a"]);
        let view = project(Some(src.clone()), Some(&model), None, &config()).unwrap();

        assert_eq!(view.get("a", None), Some(Value::Int(1)));
        src.set("a", Value::Int(2), None);
        assert_eq!(view.get("a", None), Some(Value::Int(2)));
    }

    // ---- actors ----

    #[test]
    fn alias_with_actor_is_scoped() {
        let src = source(&[("c", Value::Int(7))]);
        let model = ModelSpec::new().projection("n", ProjectionDecl::new().source("c").actor("john"));
        let view = project(Some(src), Some(&model), None, &config()).unwrap();

        assert_eq!(view.get("n", None), None);
        assert_eq!(view.get("n", Some(&john())), Some(Value::Int(7)));
        assert!(view.snapshot(None).is_empty());
    }

    #[test]
    fn reflect_reads_with_requesting_actor() {
        let src = source(&[]);
        src.set("a", Value::Int(5), Some(&john()));
        let model = ModelSpec::new().projection_names(["a"]);
        let view = project(Some(src), Some(&model), None, &config()).unwrap();

        assert_eq!(view.get("a", None), None);
        assert_eq!(view.get("a", Some(&john())), Some(Value::Int(5)));
    }

    // ---- inheritance and attributes ----

    #[test]
    fn parent_projections_come_first() {
        let base = ModelSpec::new().projection("shared", "a").projection("base_only", true);
        let child = ModelSpec::new().extends(base).projection("shared", "b");
        let rules = compile_projections(&child).unwrap();
        let targets: Vec<&str> = rules.iter().map(|r| r.target.as_str()).collect();
        assert_eq!(targets, vec!["shared", "base_only", "shared"]);

        let src = source(&[("a", Value::Int(1)), ("b", Value::Int(2)), ("base_only", Value::Int(3))]);
        let view = project(Some(src), Some(&child), None, &config()).unwrap();
        assert_eq!(view.get("shared", None), Some(Value::Int(2)));
        assert_eq!(view.get("base_only", None), Some(Value::Int(3)));
    }

    #[test]
    fn attributes_bind_after_projections() {
        let src = source(&[("a", Value::Int(4))]);
        let model = ModelSpec::new()
            .projection_names(["a"])
            .attribute("label", AttributeDecl::new().default_value("view"))
            .attribute(
                "square",
                AttributeSpec::derive(|view, actor| {
                    let a = view.get("a", actor)?.as_int()?;
                    Some(Value::Int(a * a))
                }),
            )
            .attribute("a", AttributeDecl::new().default_value(0));

        let view = project(Some(src), Some(&model), None, &config()).unwrap();
        assert_eq!(view.get("label", None), Some(Value::from("view")));
        assert_eq!(view.get("square", None), Some(Value::Int(16)));
        // The projected value blocks the attribute default.
        assert_eq!(view.get("a", None), Some(Value::Int(4)));
    }

    #[test]
    fn class_resolution_and_override() {
        let custom = RecordClass::new("Summary", RecordKind::Projection);
        let model = ModelSpec::new().class(custom.clone()).projection_names(["a"]);
        let view = project(Some(source(&[])), Some(&model), None, &config()).unwrap();
        assert_eq!(view.class(), &custom);

        let over = RecordClass::new("Other", RecordKind::Projection);
        let view = project(Some(source(&[])), Some(&model), Some(&over), &config()).unwrap();
        assert_eq!(view.class_name(), "Other");
    }

    // ---- degenerate inputs ----

    #[test]
    fn untyped_projection_is_empty_view() {
        let class = RecordClass::new("Bare", RecordKind::Projection);
        let view = project(None, None, Some(&class), &config()).unwrap();
        assert_eq!(view.class_name(), "Bare");
        assert!(view.is_empty());
        assert!(view.source().is_none());
    }

    #[test]
    fn missing_source_makes_everything_undefined() {
        let model = ModelSpec::new()
            .projection("a", true)
            .projection("x", ProjectionSpec::map(|_| Some(Value::Int(1))))
            .projection("r", ProjectionDecl::new().sources(["a"]));
        let view = project(None, Some(&model), None, &config()).unwrap();
        assert!(view.snapshot(None).is_empty());
    }

    #[test]
    fn invalid_projection_fails_before_view_exists() {
        let mut model = ModelSpec::new();
        model.projections.push(ProjectionSpec::Reflect);
        let err = project(Some(source(&[])), Some(&model), None, &config()).unwrap_err();
        assert!(matches!(err, BindingError::InvalidSpec { .. }));
    }
}
