//! Per-call merge state.

use crate::boundary::Boundary;
use crate::cycle::CycleTracker;
use crate::metadata::{Classification, MetadataLocator};
use crate::MergeResult;
use serde::Serialize;
use stagesync_model::SchemaRegistry;
use std::collections::HashMap;
use std::rc::Rc;

/// Counters collected during one top-level merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeStats {
    /// Source objects merged onto a target object.
    pub merged: usize,
    /// Target objects created by the factory.
    pub created: usize,
    /// References re-resolved against the target store.
    pub resolved: usize,
    /// Elements removed from target collections.
    pub detached: usize,
    /// Value objects merged onto an equal existing element.
    pub value_merged: usize,
}

/// Scratch state owned by one top-level merge and passed down the recursion.
///
/// Never shared between calls.
#[derive(Debug)]
pub(crate) struct MergeSession {
    pub(crate) cycles: CycleTracker,
    pub(crate) boundary: Boundary,
    pub(crate) stats: MergeStats,
    classifications: HashMap<String, Rc<Classification>>,
}

impl MergeSession {
    pub(crate) fn new(boundary: Boundary) -> Self {
        Self {
            cycles: CycleTracker::new(),
            boundary,
            stats: MergeStats::default(),
            classifications: HashMap::new(),
        }
    }

    /// Classifies `entity_type` once per session.
    pub(crate) fn classification(
        &mut self,
        metadata: &MetadataLocator,
        registry: &SchemaRegistry,
        entity_type: &str,
    ) -> MergeResult<Rc<Classification>> {
        if let Some(cached) = self.classifications.get(entity_type) {
            return Ok(Rc::clone(cached));
        }
        let classification = Rc::new(metadata.classify(registry, entity_type)?);
        self.classifications
            .insert(entity_type.to_string(), Rc::clone(&classification));
        Ok(classification)
    }
}
