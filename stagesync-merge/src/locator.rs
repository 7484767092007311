//! Stable-identity extraction and target-store lookup.

use crate::MergeResult;
use stagesync_model::{ObjectGraph, SchemaRegistry};
use stagesync_types::ObjectId;

/// Reads and compares GUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct GuidLocator;

impl GuidLocator {
    /// The GUID of `object`, or `None` when its type has none or it is unset.
    pub fn identity_of(
        &self,
        registry: &SchemaRegistry,
        graph: &ObjectGraph,
        object: ObjectId,
    ) -> Option<String> {
        registry.guid_of(graph, object)
    }

    /// Whether elements of `entity_type` can be matched by GUID.
    pub fn can_qualify_by_guid(&self, registry: &SchemaRegistry, entity_type: &str) -> bool {
        registry.identity_field(entity_type).is_some()
    }

    /// True when both objects carry a GUID and the GUIDs match.
    pub fn same_identity(
        &self,
        registry: &SchemaRegistry,
        graph_a: &ObjectGraph,
        a: ObjectId,
        graph_b: &ObjectGraph,
        b: ObjectId,
    ) -> bool {
        match (
            self.identity_of(registry, graph_a, a),
            self.identity_of(registry, graph_b, b),
        ) {
            (Some(ga), Some(gb)) => ga == gb,
            _ => false,
        }
    }
}

/// Finds target-store objects by stable identity.
///
/// Implementations backed by a real store load the object into `target`
/// (the unit of work) and return its handle there.
pub trait EntityLocator: Send + Sync {
    /// Locates a reference-only entity.
    fn locate_reference(
        &self,
        registry: &SchemaRegistry,
        target: &mut ObjectGraph,
        entity_type: &str,
        guid: &str,
    ) -> MergeResult<Option<ObjectId>>;

    /// Locates a filtered collection element.
    fn locate(
        &self,
        registry: &SchemaRegistry,
        target: &mut ObjectGraph,
        entity_type: &str,
        guid: &str,
    ) -> MergeResult<Option<ObjectId>> {
        self.locate_reference(registry, target, entity_type, guid)
    }
}

/// Looks entities up in the target graph itself.
///
/// Matches objects of `entity_type` or any subtype.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphEntityLocator;

impl EntityLocator for GraphEntityLocator {
    fn locate_reference(
        &self,
        registry: &SchemaRegistry,
        target: &mut ObjectGraph,
        entity_type: &str,
        guid: &str,
    ) -> MergeResult<Option<ObjectId>> {
        let found = target.iter().find_map(|(id, object)| {
            if !registry.is_a(object.entity_type(), entity_type) {
                return None;
            }
            (registry.guid_of(target, id).as_deref() == Some(guid)).then_some(id)
        });
        Ok(found)
    }
}
