//! Target object factory.

use crate::{MergeError, MergeResult};
use stagesync_model::{FieldMapping, Object, ObjectGraph, SchemaRegistry, Slot};
use stagesync_types::{ObjectId, Value};
use tracing::trace;

/// Creates empty target-side objects.
pub trait ObjectFactory: Send + Sync {
    fn create(
        &self,
        registry: &SchemaRegistry,
        target: &mut ObjectGraph,
        entity_type: &str,
    ) -> MergeResult<ObjectId>;
}

/// Builds objects from their registered schema.
///
/// Every field of the lineage starts as the null of its shape, except to-many
/// fields, which start as an empty container of the declared kind. The
/// lineage's `on_create` hooks then run root-first.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaObjectFactory;

impl ObjectFactory for SchemaObjectFactory {
    fn create(
        &self,
        registry: &SchemaRegistry,
        target: &mut ObjectGraph,
        entity_type: &str,
    ) -> MergeResult<ObjectId> {
        let lineage = registry
            .lineage(entity_type)
            .map_err(|e| MergeError::Instantiation {
                entity_type: entity_type.into(),
                reason: e.to_string(),
            })?;

        let mut object = Object::new(entity_type);
        for schema in &lineage {
            for field in &schema.fields {
                let slot = match &field.mapping {
                    FieldMapping::ToOne { .. } => Slot::Ref(None),
                    FieldMapping::ToMany(mapping) => Slot::Many(Some(mapping.container.empty())),
                    FieldMapping::Id
                    | FieldMapping::Version
                    | FieldMapping::Guid
                    | FieldMapping::Basic
                    | FieldMapping::Transient => Slot::Value(Value::Null),
                };
                object.set(&field.name, slot);
            }
        }

        let hooks: Vec<(String, String)> = lineage
            .iter()
            .filter_map(|s| s.on_create.clone().map(|h| (s.entity_type.clone(), h)))
            .collect();

        let id = target.insert(object);
        for (declaring_type, hook) in hooks {
            registry.run_hook(&declaring_type, &hook, target, id)?;
        }
        trace!("Created {} at {}", entity_type, id);
        Ok(id)
    }
}
