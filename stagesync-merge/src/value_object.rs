//! Field-by-field merging of identity-less value objects.

use crate::MergeResult;
use stagesync_model::{FieldMapping, ObjectGraph, SchemaRegistry};
use stagesync_types::ObjectId;
use std::collections::HashSet;

/// Merges a new value object onto an equal, already attached one.
pub trait ValueObjectMerger: Send + Sync {
    /// Whether equal elements of `entity_type` are merged instead of added.
    fn is_merge_required(&self, registry: &SchemaRegistry, entity_type: &str) -> bool;

    /// Overwrites `existing` with the state of `new`. Both live in `graph`.
    fn merge(
        &self,
        registry: &SchemaRegistry,
        graph: &mut ObjectGraph,
        new: ObjectId,
        existing: ObjectId,
    ) -> MergeResult<()>;
}

/// Copies every persisted slot of the lineage from the new element.
///
/// Applies to all identity-less types unless restricted with
/// [`for_types`](Self::for_types).
#[derive(Debug, Clone, Default)]
pub struct FieldwiseValueObjectMerger {
    only: Option<HashSet<String>>,
}

impl FieldwiseValueObjectMerger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_types<'a>(types: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            only: Some(types.into_iter().map(str::to_string).collect()),
        }
    }
}

impl ValueObjectMerger for FieldwiseValueObjectMerger {
    fn is_merge_required(&self, registry: &SchemaRegistry, entity_type: &str) -> bool {
        if registry.identity_field(entity_type).is_some() {
            return false;
        }
        self.only
            .as_ref()
            .is_none_or(|types| types.contains(entity_type))
    }

    fn merge(
        &self,
        registry: &SchemaRegistry,
        graph: &mut ObjectGraph,
        new: ObjectId,
        existing: ObjectId,
    ) -> MergeResult<()> {
        let source = graph.object(new)?;
        let lineage = registry.lineage(source.entity_type())?;
        let copies: Vec<_> = lineage
            .iter()
            .flat_map(|s| s.fields.iter())
            .filter(|f| {
                !matches!(
                    f.mapping,
                    FieldMapping::Id | FieldMapping::Version | FieldMapping::Transient
                )
            })
            .filter_map(|f| source.slot(&f.name).map(|slot| (f.name.clone(), slot.clone())))
            .collect();

        let target = graph.object_mut(existing)?;
        for (name, slot) in copies {
            target.set(&name, slot);
        }
        Ok(())
    }
}
