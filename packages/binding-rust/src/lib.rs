//! `modelbind`: compiles declarative models and binds them to actor-scoped
//! records.
//!
//! A [`ModelSpec`] declares attributes, projections, a record class, and an
//! optional parent model. The engine:
//!
//! - compiles a model and its `extends` chain into one attribute table
//!   ([`compile()`]),
//! - binds an input image to a new record through that table
//!   ([`materialize()`]),
//! - builds live read-only views over an existing record ([`project()`]),
//! - summarizes a model for tooling ([`describe()`]).
//!
//! The free functions use [`BinderConfig::default`]; use a [`Binder`] to
//! supply other default classes.
//!
//! # Examples
//!
//! ```
//! use modelbind::{materialize, AttributeDecl, Image, ModelSpec, Record, Value};
//!
//! let base = ModelSpec::new().attribute("message", AttributeDecl::new().default_value("gello!"));
//! let model = ModelSpec::new().extends(base).attribute_names(["a"]);
//!
//! let mut image = Image::new();
//! image.insert("a".to_string(), Value::Int(200));
//! image.insert("b".to_string(), Value::Int(100));
//!
//! let record = materialize(&image, Some(&model), None).unwrap();
//! assert_eq!(record.get("a", None), Some(Value::Int(200)));
//! assert_eq!(record.get("b", None), None);
//! assert_eq!(record.get("message", None), Some(Value::from("gello!")));
//! ```

use std::sync::Arc;

pub mod binder;
pub mod compiler;
pub mod config;
pub mod describe;
pub mod error;
pub mod materialize;
pub mod normalize;
pub mod project;
pub mod registry;
pub mod spec;

pub use binder::Binder;
pub use compiler::{resolve_class, CompiledModel};
pub use config::BinderConfig;
pub use describe::{AttributeDescriptor, ClassDescriptor, Descriptor, DERIVED_MARKER};
pub use error::{BindingError, Result};
pub use normalize::{
    normalize_attribute, normalize_projection, AttributeType, Combinator, CompiledAttribute,
    ProjectionRule,
};
pub use project::compile_projections;
pub use registry::{DefaultValue, TypeDescriptor, TypeRegistry};
pub use spec::{
    AttributeDecl, AttributeSpec, Declarations, Extends, MapFn, ModelSpec, ProjectionDecl,
    ProjectionSpec, ReduceFn, Source,
};

pub use modelbind_core::{ActorId, Image, Record, RecordClass, RecordKind, Snapshot, State, Value};

/// Compiles `model` with the default state class.
///
/// # Errors
///
/// See [`compiler::compile`].
pub fn compile(model: &ModelSpec) -> Result<CompiledModel> {
    compiler::compile(model, &BinderConfig::default().state_class)
}

/// Materializes `image` with the default configuration.
///
/// # Errors
///
/// See [`materialize::materialize`].
pub fn materialize(
    image: &Image,
    model: Option<&ModelSpec>,
    class: Option<&RecordClass>,
) -> Result<State> {
    materialize::materialize(image, model, class, &BinderConfig::default())
}

/// Projects `source` with the default configuration.
///
/// # Errors
///
/// See [`project::project`].
pub fn project(
    source: Option<Arc<State>>,
    model: Option<&ModelSpec>,
    class: Option<&RecordClass>,
) -> Result<State> {
    project::project(source, model, class, &BinderConfig::default())
}

/// Describes `model` with the default configuration.
///
/// # Errors
///
/// See [`describe::describe`].
pub fn describe(model: &ModelSpec) -> Result<Descriptor> {
    describe::describe(model, &BinderConfig::default())
}
