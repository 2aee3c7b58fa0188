use std::sync::Arc;

use modelbind_core::{Image, RecordClass, State};

use crate::compiler::{self, CompiledModel};
use crate::config::BinderConfig;
use crate::describe::{self, Descriptor};
use crate::error::Result;
use crate::materialize;
use crate::project;
use crate::spec::ModelSpec;

/// Entry point bundling the engine operations with one configuration.
///
/// Cheap to clone and safe to share across threads; every call compiles
/// the model afresh and nothing is cached between calls.
#[derive(Debug, Clone, Default)]
pub struct Binder {
    config: Arc<BinderConfig>,
}

impl Binder {
    #[must_use]
    pub fn new(config: BinderConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    #[must_use]
    pub fn config(&self) -> &BinderConfig {
        &self.config
    }

    /// Compiles `model` into its class and flattened attribute table.
    ///
    /// # Errors
    ///
    /// See [`compiler::compile`].
    pub fn compile(&self, model: &ModelSpec) -> Result<CompiledModel> {
        compiler::compile(model, &self.config.state_class)
    }

    /// Binds `image` to a new record typed by `model`.
    ///
    /// # Errors
    ///
    /// See [`materialize::materialize`].
    pub fn materialize(
        &self,
        image: &Image,
        model: Option<&ModelSpec>,
        class: Option<&RecordClass>,
    ) -> Result<State> {
        materialize::materialize(image, model, class, &self.config)
    }

    /// Builds a live view over `source` shaped by `model`.
    ///
    /// # Errors
    ///
    /// See [`project::project`].
    pub fn project(
        &self,
        source: Option<Arc<State>>,
        model: Option<&ModelSpec>,
        class: Option<&RecordClass>,
    ) -> Result<State> {
        project::project(source, model, class, &self.config)
    }

    /// Summarizes `model` as a serializable [`Descriptor`].
    ///
    /// # Errors
    ///
    /// See [`describe::describe`].
    pub fn describe(&self, model: &ModelSpec) -> Result<Descriptor> {
        describe::describe(model, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use modelbind_core::{ActorId, Record, RecordKind, Value};

    use super::*;
    use crate::spec::{AttributeDecl, ProjectionDecl};

    fn account_model() -> ModelSpec {
        let base = ModelSpec::new()
            .name("base")
            .attribute("created", AttributeDecl::new().default_value("today"));
        ModelSpec::new()
            .extends(base)
            .class(RecordClass::new("Account", RecordKind::State))
            .attribute_names(["balance", "owner"])
            .attribute("secret", AttributeDecl::new().actor("john"))
    }

    fn summary_model() -> ModelSpec {
        ModelSpec::new()
            .projection_names(["owner"])
            .projection("money", "balance")
            .projection("pin", ProjectionDecl::new().source("secret").actor("john"))
    }

    #[test]
    fn materialize_then_project() {
        let binder = Binder::default();
        let image: Image = [
            ("balance".to_string(), Value::Int(40)),
            ("owner".to_string(), Value::from("john")),
            ("secret".to_string(), Value::Int(1234)),
            ("ignored".to_string(), Value::Bool(true)),
        ]
        .into_iter()
        .collect();

        let account = binder.materialize(&image, Some(&account_model()), None).unwrap();
        assert_eq!(account.class_name(), "Account");
        assert_eq!(account.names(), vec!["balance", "created", "owner", "secret"]);

        let account = Arc::new(account);
        let summary = binder
            .project(Some(account.clone()), Some(&summary_model()), None)
            .unwrap();
        let john = ActorId::new("john");

        assert_eq!(summary.snapshot(None).len(), 2);
        assert_eq!(summary.get("money", None), Some(Value::Int(40)));
        assert_eq!(summary.get("pin", Some(&john)), Some(Value::Int(1234)));

        account.set("balance", Value::Int(50), None);
        assert_eq!(summary.get("money", None), Some(Value::Int(50)));
    }

    #[test]
    fn shared_across_threads() {
        let binder = Binder::default();
        let model = Arc::new(account_model());
        std::thread::scope(|scope| {
            for n in 0..4_i64 {
                let binder = binder.clone();
                let model = model.clone();
                scope.spawn(move || {
                    let image: Image = [("balance".to_string(), Value::Int(n))].into_iter().collect();
                    let record = binder.materialize(&image, Some(model.as_ref()), None).unwrap();
                    assert_eq!(record.get("balance", None), Some(Value::Int(n)));
                });
            }
        });
    }

    #[test]
    fn custom_default_classes() {
        let binder = Binder::new(BinderConfig {
            state_class: RecordClass::new("Doc", RecordKind::State),
            projection_class: RecordClass::new("DocView", RecordKind::Projection),
            ..BinderConfig::default()
        });
        let model = ModelSpec::new().attribute_names(["a"]).projection_names(["a"]);

        assert_eq!(binder.compile(&model).unwrap().class.name(), "Doc");
        assert_eq!(binder.describe(&model).unwrap().name, "Doc extension");

        let record = binder.materialize(&Image::new(), Some(&model), None).unwrap();
        assert_eq!(record.class_name(), "Doc");
        let view = binder.project(Some(Arc::new(record)), Some(&model), None).unwrap();
        assert_eq!(view.class_name(), "DocView");
        assert_eq!(binder.config().describe_suffix, "extension");
    }
}
