use modelbind_core::RecordClass;

/// Engine-level configuration for the binder.
///
/// Supplies the record classes used when a model (and its whole `extends`
/// chain) declares none, plus the fallbacks the describer writes.
#[derive(Debug, Clone)]
pub struct BinderConfig {
    /// Class constructed by `compile` and `materialize` when no class resolves.
    pub state_class: RecordClass,
    /// Class constructed by `project` when no class resolves.
    pub projection_class: RecordClass,
    /// Appended to the resolved class name to name an unnamed descriptor.
    pub describe_suffix: String,
    /// Description written for models that declare none.
    pub default_description: String,
}

impl Default for BinderConfig {
    fn default() -> Self {
        Self {
            state_class: RecordClass::state(),
            projection_class: RecordClass::projection(),
            describe_suffix: "extension".to_string(),
            default_description: "no description".to_string(),
        }
    }
}
