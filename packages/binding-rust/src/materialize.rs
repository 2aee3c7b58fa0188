//! Materializer: binds an input image to a freshly constructed record.

use modelbind_core::{Image, Record, RecordClass, State};
use tracing::{debug, trace};

use crate::compiler::compile;
use crate::config::BinderConfig;
use crate::error::Result;
use crate::normalize::CompiledAttribute;
use crate::registry::DefaultValue;
use crate::spec::ModelSpec;

/// Constructs a record from `image`, typed by `model`.
///
/// Without a model every image entry is copied as-is into a record of
/// `class` (or the configured state class). With a model, only declared
/// attributes are bound; undeclared image keys are dropped. `class`
/// overrides the class resolved from the model chain.
///
/// # Errors
///
/// Fails with the compiler's errors before any record is constructed.
pub fn materialize(
    image: &Image,
    model: Option<&ModelSpec>,
    class: Option<&RecordClass>,
    config: &BinderConfig,
) -> Result<State> {
    let Some(model) = model else {
        let class = class.unwrap_or(&config.state_class);
        debug!(class = class.name(), entries = image.len(), "materialized untyped image");
        return Ok(State::from_image(class, image));
    };

    let compiled = compile(model, &config.state_class)?;
    let class = class.unwrap_or(&compiled.class);
    let record = State::new(class);
    bind_attributes(image, &record, &compiled.attributes);

    debug!(
        class = class.name(),
        attributes = compiled.attributes.len(),
        entries = image.len(),
        "materialized record"
    );
    Ok(record)
}

/// Binds each compiled attribute on `record`, in table order.
///
/// A derivation is always bound lazily. Otherwise the image value wins, then
/// any value the record already holds, then the attribute's default.
pub(crate) fn bind_attributes(image: &Image, record: &State, attributes: &[CompiledAttribute]) {
    for attr in attributes {
        let name = attr.name.as_str();
        let actor = attr.actor.as_ref();

        if let Some(f) = &attr.derive {
            record.derive(name, f.clone(), actor);
            continue;
        }

        if let Some(value) = image.get(name) {
            record.set(name, value.clone(), actor);
            continue;
        }

        // Compromise kept for compatibility: an existing value (from the
        // class initializer or an earlier binding step) blocks the default.
        // This also stops a child's default from refreshing an ancestor's.
        // Pending derivations count as existing and are not forced here.
        if record.has_value(name, actor) {
            trace!(name, class = record.class_name(), "existing value kept, default skipped");
            continue;
        }

        match attr.effective_default() {
            Some(DefaultValue::Static(value)) => record.set(name, value.clone(), actor),
            Some(DefaultValue::Generator(f)) => record.derive(name, f.clone(), actor),
            None => {}
        }
    }
}
