//! Actor-scoped record storage backed by [`DashMap`].
//!
//! [`State`] is the concrete [`Record`] the binding engine populates. Every
//! attribute lives in a slot keyed by `(name, actor scope)` and holds one of:
//!
//! - a static value written with [`Record::set`],
//! - a lazy derivation registered with [`Record::derive`], evaluated on first
//!   read by each requesting actor and cached per actor for the lifetime of
//!   the record,
//! - a live binding registered with [`State::bind`], re-evaluated against the
//!   view's source record on every read.
//!
//! # Visibility
//!
//! A read made on behalf of actor `A` resolves the `A`-scoped slot first and
//! falls back to the unscoped slot. A read made without an actor only sees
//! unscoped slots.
//!
//! # Concurrency
//!
//! `State` is `Send + Sync`. Slots are cloned out of the map before they are
//! evaluated, so no shard lock is held while user code runs and derivations
//! may freely read sibling attributes. Each derivation keeps one [`OnceLock`]
//! per requesting actor, which guarantees a single invocation per actor even
//! when several threads race on the first read.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;

use crate::class::RecordClass;
use crate::traits::{BindFn, DeriveFn, Record};
use crate::types::{ActorId, Image, Snapshot, Value};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SlotKey {
    name: String,
    actor: Option<ActorId>,
}

impl SlotKey {
    fn new(name: &str, actor: Option<&ActorId>) -> Self {
        Self {
            name: name.to_string(),
            actor: actor.cloned(),
        }
    }
}

/// Memoized derivation: the function plus one once-filled result per
/// requesting actor. Readers never see another actor's result.
struct Derivation {
    f: DeriveFn,
    cells: DashMap<Option<ActorId>, Arc<OnceLock<Option<Value>>>>,
}

impl Derivation {
    fn new(f: DeriveFn) -> Self {
        Self {
            f,
            cells: DashMap::new(),
        }
    }

    /// The cell for `actor`, created on first use. The map guard is released
    /// before the caller fills the cell.
    fn cell(&self, actor: Option<&ActorId>) -> Arc<OnceLock<Option<Value>>> {
        Arc::clone(&self.cells.entry(actor.cloned()).or_default())
    }

    /// The cached result for `actor`, if it has been computed.
    fn cached(&self, actor: Option<&ActorId>) -> Option<Option<Value>> {
        self.cells
            .get(&actor.cloned())
            .and_then(|cell| cell.value().get().cloned())
    }
}

#[derive(Clone)]
enum Slot {
    Value(Value),
    Derived(Arc<Derivation>),
    Bound(BindFn),
}

/// A mutable, actor-scoped record.
///
/// # Examples
///
/// ```
/// use modelbind_core::{ActorId, Record, State, Value};
///
/// let john = ActorId::new("john");
/// let state = State::default();
/// state.set("a", Value::Int(100), Some(&john));
/// state.set("b", Value::Int(200), None);
///
/// assert_eq!(state.get("a", None), None);
/// assert_eq!(state.get("a", Some(&john)), Some(Value::Int(100)));
/// assert_eq!(state.snapshot(None).len(), 1);
/// assert_eq!(state.snapshot(Some(&john)).len(), 2);
/// ```
pub struct State {
    class: RecordClass,
    source: Option<Arc<State>>,
    slots: DashMap<SlotKey, Slot>,
}

impl State {
    /// Constructs a record of the given class and runs the class initializer.
    #[must_use]
    pub fn new(class: &RecordClass) -> Self {
        let state = Self {
            class: class.clone(),
            source: None,
            slots: DashMap::new(),
        };
        class.initialize(&state);
        state
    }

    /// Constructs a view over `source` and runs the class initializer.
    #[must_use]
    pub fn view(class: &RecordClass, source: Option<Arc<State>>) -> Self {
        let state = Self {
            class: class.clone(),
            source,
            slots: DashMap::new(),
        };
        class.initialize(&state);
        state
    }

    /// Constructs a record of `class` holding every image entry as an
    /// unscoped value. Image entries overwrite anything the initializer seeded.
    #[must_use]
    pub fn from_image(class: &RecordClass, image: &Image) -> Self {
        let state = Self::new(class);
        for (name, value) in image {
            state.set(name, value.clone(), None);
        }
        state
    }

    #[must_use]
    pub fn class(&self) -> &RecordClass {
        &self.class
    }

    #[must_use]
    pub fn class_name(&self) -> &str {
        self.class.name()
    }

    /// The record a view reads from, if this is a view with a source.
    #[must_use]
    pub fn source(&self) -> Option<&State> {
        self.source.as_deref()
    }

    /// Registers a live binding, re-evaluated against the source on every read.
    pub fn bind(&self, name: &str, f: BindFn, actor: Option<&ActorId>) {
        self.slots.insert(SlotKey::new(name, actor), Slot::Bound(f));
    }

    /// Whether a slot is visible to `actor`, without evaluating it.
    #[must_use]
    pub fn contains(&self, name: &str, actor: Option<&ActorId>) -> bool {
        self.slot(name, actor).is_some()
    }

    /// Whether a defined value is visible to `actor`, without forcing lazy
    /// evaluation.
    ///
    /// A derivation counts as holding a value until it has been evaluated
    /// for `actor` and produced nothing. Live bindings are read through;
    /// they are never cached.
    #[must_use]
    pub fn has_value(&self, name: &str, actor: Option<&ActorId>) -> bool {
        match self.slot(name, actor) {
            None => false,
            Some(Slot::Value(_)) => true,
            Some(Slot::Derived(derivation)) => !matches!(derivation.cached(actor), Some(None)),
            Some(Slot::Bound(f)) => f(self.source(), actor).is_some(),
        }
    }

    /// Distinct attribute names across all actor scopes, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let names: BTreeSet<String> = self.slots.iter().map(|e| e.key().name.clone()).collect();
        names.into_iter().collect()
    }

    /// Number of slots, counting each actor scope separately.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn slot(&self, name: &str, actor: Option<&ActorId>) -> Option<Slot> {
        if let Some(actor) = actor {
            if let Some(slot) = self.slots.get(&SlotKey::new(name, Some(actor))) {
                return Some(slot.value().clone());
            }
        }
        self.slots
            .get(&SlotKey::new(name, None))
            .map(|slot| slot.value().clone())
    }

    fn evaluate(&self, name: &str, slot: Slot, actor: Option<&ActorId>) -> Option<Value> {
        match slot {
            Slot::Value(value) => Some(value),
            Slot::Derived(derivation) => derivation
                .cell(actor)
                .get_or_init(|| {
                    tracing::trace!(
                        name,
                        actor = actor.map(ActorId::as_str),
                        class = self.class_name(),
                        "evaluating derivation"
                    );
                    (derivation.f)(self, actor)
                })
                .clone(),
            Slot::Bound(f) => f(self.source(), actor),
        }
    }
}

impl Record for State {
    fn set(&self, name: &str, value: Value, actor: Option<&ActorId>) {
        self.slots.insert(SlotKey::new(name, actor), Slot::Value(value));
    }

    fn get(&self, name: &str, actor: Option<&ActorId>) -> Option<Value> {
        let slot = self.slot(name, actor)?;
        self.evaluate(name, slot, actor)
    }

    fn derive(&self, name: &str, f: DeriveFn, actor: Option<&ActorId>) {
        self.slots.insert(
            SlotKey::new(name, actor),
            Slot::Derived(Arc::new(Derivation::new(f))),
        );
    }

    fn snapshot(&self, actor: Option<&ActorId>) -> Snapshot {
        // Collect first: evaluation may read other slots and must not run
        // while a shard guard is held.
        let mut visible: BTreeMap<String, Slot> = BTreeMap::new();
        for entry in &self.slots {
            let key = entry.key();
            match (&key.actor, actor) {
                (None, _) => {
                    visible
                        .entry(key.name.clone())
                        .or_insert_with(|| entry.value().clone());
                }
                (Some(owner), Some(reader)) if owner == reader => {
                    visible.insert(key.name.clone(), entry.value().clone());
                }
                _ => {}
            }
        }

        visible
            .into_iter()
            .filter_map(|(name, slot)| {
                let value = self.evaluate(&name, slot, actor)?;
                Some((name, value))
            })
            .collect()
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new(&RecordClass::state())
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("class", &self.class.name())
            .field("slots", &self.slots.len())
            .field("has_source", &self.source.is_some())
            .finish()
    }
}
