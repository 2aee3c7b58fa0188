//! Record classes: named constructors for [`State`] records.
//!
//! A [`RecordClass`] decides which kind of record a model produces and may
//! carry an initializer that runs when the record is constructed. The
//! initializer is the place where a class pre-seeds attributes, and those
//! pre-seeded values take precedence over model defaults during binding.

use std::fmt;
use std::sync::Arc;

use crate::state::State;

/// Initializer hook run against every freshly constructed record of a class.
pub type ClassInit = Arc<dyn Fn(&State) + Send + Sync>;

/// The two record shapes the engine knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// A plain mutable record populated from an image.
    State,
    /// A read-only view whose attributes are computed from a source record.
    Projection,
}

/// A named record constructor.
///
/// Classes compare equal when their names and kinds match; the initializer
/// does not take part in equality.
///
/// # Examples
///
/// ```
/// use modelbind_core::{Record, RecordClass, RecordKind, State};
///
/// let class = RecordClass::new("Greeting", RecordKind::State)
///     .with_init(|state: &State| state.set("message", "gello!".into(), None));
///
/// let state = State::new(&class);
/// assert_eq!(state.class_name(), "Greeting");
/// assert_eq!(state.get("message", None), Some("gello!".into()));
/// ```
#[derive(Clone)]
pub struct RecordClass {
    name: Arc<str>,
    kind: RecordKind,
    init: Option<ClassInit>,
}

impl RecordClass {
    /// Name of the built-in plain record class.
    pub const STATE: &'static str = "State";
    /// Name of the built-in view record class.
    pub const PROJECTION: &'static str = "Projection";

    /// Creates a class with no initializer.
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>, kind: RecordKind) -> Self {
        Self {
            name: name.into(),
            kind,
            init: None,
        }
    }

    /// The built-in base record class.
    #[must_use]
    pub fn state() -> Self {
        Self::new(Self::STATE, RecordKind::State)
    }

    /// The built-in base view class.
    #[must_use]
    pub fn projection() -> Self {
        Self::new(Self::PROJECTION, RecordKind::Projection)
    }

    /// Attaches an initializer run on every construction of this class.
    #[must_use]
    pub fn with_init<F>(mut self, init: F) -> Self
    where
        F: Fn(&State) + Send + Sync + 'static,
    {
        self.init = Some(Arc::new(init));
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// Runs the initializer, if any, against a freshly built record.
    pub(crate) fn initialize(&self, state: &State) {
        if let Some(init) = &self.init {
            init(state);
        }
    }
}

impl PartialEq for RecordClass {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.kind == other.kind
    }
}

impl Eq for RecordClass {}

impl fmt::Debug for RecordClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordClass")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("init", &self.init.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_classes() {
        assert_eq!(RecordClass::state().name(), "State");
        assert_eq!(RecordClass::state().kind(), RecordKind::State);
        assert_eq!(RecordClass::projection().name(), "Projection");
        assert_eq!(RecordClass::projection().kind(), RecordKind::Projection);
    }

    #[test]
    fn equality_ignores_initializer() {
        let plain = RecordClass::new("Extension", RecordKind::State);
        let seeded = RecordClass::new("Extension", RecordKind::State).with_init(|_| {});
        assert_eq!(plain, seeded);
        assert_ne!(plain, RecordClass::new("Extension", RecordKind::Projection));
    }
}
