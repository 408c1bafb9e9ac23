//! Event-class registry: per-kind squashability rules and merge functions.
//!
//! The set of event kinds is closed once the engine is built, so classes live
//! in a flat `Vec` indexed by `KindId` and dispatch through plain function
//! pointers. No trait objects, no runtime registration after setup.

use crate::error::CoreError;
use crate::events::bundle::EventBundle;

/// Index of a registered event class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct KindId(usize);

impl KindId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }

    #[inline]
    pub const fn from_index(index: usize) -> Self {
        Self(index)
    }
}

/// Merge a candidate bundle into the accumulated one.
///
/// Must be associative in effect: folding bundles in one cycle at a time has
/// to produce the same accumulator as one merge of their union, because the
/// number of cycles merged before a flush is unbounded.
pub type MergeFn = fn(&mut EventBundle, &EventBundle);

/// Default merge: last valid write wins, invalid candidates are no-ops.
pub fn merge_last_write_wins(accumulated: &mut EventBundle, candidate: &EventBundle) {
    if candidate.valid {
        *accumulated = candidate.clone();
    }
}

fn always_squashable(_candidate: &EventBundle, _accumulated: &EventBundle) -> bool {
    true
}

fn always_squash_base(_accumulated: &EventBundle) -> bool {
    true
}

fn never_squashable(_candidate: &EventBundle, _accumulated: &EventBundle) -> bool {
    false
}

fn never_squash_base(_accumulated: &EventBundle) -> bool {
    false
}

/// Squashability contract for one event kind.
pub struct EventClass {
    pub name: String,
    /// May `candidate` merge into `accumulated` without losing
    /// checker-visible information?
    pub supports_squash: fn(&EventBundle, &EventBundle) -> bool,
    /// Is the accumulated state itself eligible to serve as a merge base?
    pub supports_squash_base: fn(&EventBundle) -> bool,
    /// Kinds whose validity this cycle gates whether this kind may merge.
    pub depends_on: Vec<KindId>,
    /// Whether this kind's identity distinguishes execution contexts; such
    /// lanes are checked against their core index every cycle.
    pub unique_core_id: bool,
    pub merge: MergeFn,
}

impl EventClass {
    /// Dependency-free, always-squashable class with last-write-wins merge.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            supports_squash: always_squashable,
            supports_squash_base: always_squash_base,
            depends_on: Vec::new(),
            unique_core_id: false,
            merge: merge_last_write_wins,
        }
    }

    /// Stock class for instruction-commit events. Commits anchor the initial
    /// flush and identify execution contexts.
    pub fn commit() -> Self {
        Self {
            unique_core_id: true,
            ..Self::new("commit")
        }
    }

    /// Stock class for register-writeback events, gated on the commit kind:
    /// a writeback only merges on cycles where its core also commits.
    pub fn writeback(commit: KindId) -> Self {
        Self::new("register-writeback").with_dependency(commit)
    }

    pub fn with_dependency(mut self, kind: KindId) -> Self {
        self.depends_on.push(kind);
        self
    }

    /// Mark the class as never mergeable; every cycle with this kind flushes.
    pub fn never_squash(mut self) -> Self {
        self.supports_squash = never_squashable;
        self.supports_squash_base = never_squash_base;
        self
    }

    pub fn with_supports_squash(mut self, f: fn(&EventBundle, &EventBundle) -> bool) -> Self {
        self.supports_squash = f;
        self
    }

    pub fn with_supports_squash_base(mut self, f: fn(&EventBundle) -> bool) -> Self {
        self.supports_squash_base = f;
        self
    }

    pub fn with_merge(mut self, f: MergeFn) -> Self {
        self.merge = f;
        self
    }

    pub fn unique_core_id(mut self) -> Self {
        self.unique_core_id = true;
        self
    }
}

/// Static registry of event classes, populated once before the first tick.
#[derive(Default)]
pub struct EventRegistry {
    classes: Vec<EventClass>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class and return its id. Names must be unique; dependency
    /// ids must already be registered (they can only be obtained from here).
    pub fn register(&mut self, class: EventClass) -> Result<KindId, CoreError> {
        if self.classes.iter().any(|c| c.name == class.name) {
            return Err(CoreError::DuplicateClass(class.name));
        }
        let id = KindId(self.classes.len());
        self.classes.push(class);
        Ok(id)
    }

    #[inline]
    pub fn get(&self, id: KindId) -> &EventClass {
        &self.classes[id.0]
    }

    pub fn lookup(&self, name: &str) -> Option<KindId> {
        self.classes
            .iter()
            .position(|c| c.name == name)
            .map(KindId)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (KindId, &EventClass)> {
        self.classes.iter().enumerate().map(|(i, c)| (KindId(i), c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::bundle::{EventBundle, Payload};
    use proptest::prelude::*;

    #[test]
    fn rejects_duplicate_names() {
        let mut registry = EventRegistry::new();
        registry.register(EventClass::commit()).unwrap();
        assert!(matches!(
            registry.register(EventClass::new("commit")),
            Err(CoreError::DuplicateClass(_))
        ));
    }

    #[test]
    fn lookup_finds_registered_kind() {
        let mut registry = EventRegistry::new();
        let commit = registry.register(EventClass::commit()).unwrap();
        let wback = registry.register(EventClass::writeback(commit)).unwrap();
        assert_eq!(registry.lookup("commit"), Some(commit));
        assert_eq!(registry.lookup("register-writeback"), Some(wback));
        assert_eq!(registry.lookup("missing"), None);
    }

    #[test]
    fn writeback_depends_on_commit() {
        let mut registry = EventRegistry::new();
        let commit = registry.register(EventClass::commit()).unwrap();
        let wback = registry.register(EventClass::writeback(commit)).unwrap();
        assert_eq!(registry.get(wback).depends_on, vec![commit]);
    }

    #[test]
    fn merge_ignores_invalid_candidate() {
        let mut acc = EventBundle::scalar(0, 7);
        merge_last_write_wins(&mut acc, &EventBundle::invalid(0));
        assert_eq!(acc.payload, Payload::Scalar(7));
        assert!(acc.valid);
    }

    fn arb_bundle() -> impl Strategy<Value = EventBundle> {
        (any::<bool>(), any::<u64>()).prop_map(|(valid, value)| EventBundle {
            valid,
            core: 0,
            payload: Payload::Scalar(value),
        })
    }

    proptest! {
        // Folding one bundle at a time must equal a single merge of the last
        // valid bundle of the sequence: the accumulator never depends on how
        // many cycles were merged, only on the merged payload.
        #[test]
        fn merge_is_associative_in_effect(bundles in prop::collection::vec(arb_bundle(), 1..16)) {
            let mut folded = EventBundle::invalid(0);
            for b in &bundles {
                merge_last_write_wins(&mut folded, b);
            }

            let mut direct = EventBundle::invalid(0);
            if let Some(last_valid) = bundles.iter().rev().find(|b| b.valid) {
                merge_last_write_wins(&mut direct, last_valid);
            }
            prop_assert_eq!(folded, direct);
        }

        // Merging (B1 then B2) into an empty base equals merging B1, then B2,
        // regardless of whether B1 went through an intermediate accumulator.
        #[test]
        fn merge_pairs_compose(b1 in arb_bundle(), b2 in arb_bundle()) {
            let mut step = EventBundle::invalid(0);
            merge_last_write_wins(&mut step, &b1);
            merge_last_write_wins(&mut step, &b2);

            let mut intermediate = EventBundle::invalid(0);
            merge_last_write_wins(&mut intermediate, &b1);
            let mut rebased = EventBundle::invalid(0);
            merge_last_write_wins(&mut rebased, &intermediate);
            merge_last_write_wins(&mut rebased, &b2);

            prop_assert_eq!(step, rebased);
        }
    }
}
