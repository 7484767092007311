//! Cyclic dependency tracking.

use stagesync_types::ObjectId;
use std::collections::HashMap;

/// Identity map from already-visited source objects to their target objects.
///
/// A source object is registered before any of its attributes are merged,
/// so a back-reference to an ancestor resolves to the target being built
/// instead of re-entering the merge.
#[derive(Debug, Clone, Default)]
pub struct CycleTracker {
    processed: HashMap<ObjectId, ObjectId>,
}

impl CycleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `source` is merged onto `target`.
    pub fn register(&mut self, source: ObjectId, target: ObjectId) {
        self.processed.insert(source, target);
    }

    /// The target already paired with `source`, if it was visited.
    pub fn target_of(&self, source: ObjectId) -> Option<ObjectId> {
        self.processed.get(&source).copied()
    }

    /// Whether some visited source object was merged onto `target`.
    pub fn maps_to(&self, target: ObjectId) -> bool {
        self.processed.values().any(|t| *t == target)
    }

    pub fn is_cyclic_dependency(&self, source: ObjectId) -> bool {
        self.processed.contains_key(&source)
    }

    pub fn clear(&mut self) {
        self.processed.clear();
    }

    pub fn len(&self) -> usize {
        self.processed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processed.is_empty()
    }
}
