//! Key extraction for map-valued associations.

use crate::metadata::CollectionAccessor;
use crate::{MergeError, MergeResult};
use stagesync_model::{ObjectGraph, SchemaRegistry};
use stagesync_types::{ObjectId, Value};

/// Derives the key an element is stored under in a map association.
pub trait MapKeyExtractor: Send + Sync {
    fn key_of(
        &self,
        registry: &SchemaRegistry,
        graph: &ObjectGraph,
        collection: &CollectionAccessor,
        element: ObjectId,
    ) -> MergeResult<String>;
}

/// Uses the association's declared `map_key` field, falling back to the
/// element's GUID.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldMapKeyExtractor;

impl MapKeyExtractor for FieldMapKeyExtractor {
    fn key_of(
        &self,
        registry: &SchemaRegistry,
        graph: &ObjectGraph,
        collection: &CollectionAccessor,
        element: ObjectId,
    ) -> MergeResult<String> {
        let object = graph.object(element)?;
        let key = match &collection.mapping.map_key {
            Some(field) => object.value(field).and_then(Value::to_key),
            None => registry.guid_of(graph, element),
        };
        key.ok_or_else(|| MergeError::MissingMapKey {
            entity_type: object.entity_type().into(),
            accessor: format!(
                "{}.{}",
                collection.accessor.declaring_type, collection.accessor.name
            ),
        })
    }
}
