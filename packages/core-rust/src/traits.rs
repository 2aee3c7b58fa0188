use std::sync::Arc;

use crate::state::State;
use crate::types::{ActorId, Snapshot, Value};

/// Lazily evaluated attribute value.
///
/// Receives the record it is bound to and the actor the read is made on
/// behalf of. Returning `None` means the attribute stays undefined.
pub type DeriveFn = Arc<dyn Fn(&State, Option<&ActorId>) -> Option<Value> + Send + Sync>;

/// Live binding evaluated against a view's source record on every read.
///
/// The source is `None` for views constructed without one.
pub type BindFn = Arc<dyn Fn(Option<&State>, Option<&ActorId>) -> Option<Value> + Send + Sync>;

/// Wraps a closure as a [`DeriveFn`].
#[must_use]
pub fn derivation<F>(f: F) -> DeriveFn
where
    F: Fn(&State, Option<&ActorId>) -> Option<Value> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Actor-scoped attribute storage consumed by the binding engine.
///
/// Writes made with an actor are visible only to reads made with the same
/// actor. Writes made without one are visible to every read.
pub trait Record: Send + Sync {
    /// Writes a static value, replacing whatever was bound under the same
    /// name and actor scope.
    fn set(&self, name: &str, value: Value, actor: Option<&ActorId>);

    /// Reads a value back, resolving the actor-scoped binding first and the
    /// unscoped binding second. Lazy bindings are evaluated here.
    fn get(&self, name: &str, actor: Option<&ActorId>) -> Option<Value>;

    /// Registers a lazy, memoized value.
    ///
    /// `f` runs at most once per requesting actor, on that actor's first
    /// read, even under concurrent reads. Each actor only ever sees the
    /// result computed for it. A derivation must not read its own
    /// attribute; doing so never completes.
    fn derive(&self, name: &str, f: DeriveFn, actor: Option<&ActorId>);

    /// Evaluates every binding visible to `actor` into a plain mapping,
    /// omitting undefined values.
    fn snapshot(&self, actor: Option<&ActorId>) -> Snapshot;
}
