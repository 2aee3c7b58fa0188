//! `modelbind` core: dynamic values, actor-scoped records, and lazy derivations.
//!
//! This crate provides the record abstraction the binding engine writes into:
//! [`Value`] for attribute data, [`ActorId`] for read visibility, the
//! [`Record`] trait, and [`State`], its concrete implementation.

pub mod class;
pub mod state;
pub mod traits;
pub mod types;

pub use class::{ClassInit, RecordClass, RecordKind};
pub use state::State;
pub use traits::{derivation, BindFn, DeriveFn, Record};
pub use types::{ActorId, Image, Snapshot, Value};
