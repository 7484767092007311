//! Entity metadata locator: classifies every attribute of a type.

use crate::inclusion::InclusionPolicy;
use crate::{MergeError, MergeResult};
use stagesync_model::{FieldMapping, FieldSchema, SchemaRegistry, ToManyMapping};
use std::collections::HashMap;
use tracing::trace;

/// One attribute (or hook) and the type that declares it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accessor {
    pub declaring_type: String,
    pub name: String,
}

impl Accessor {
    fn new(declaring_type: &str, name: &str) -> Self {
        Self {
            declaring_type: declaring_type.into(),
            name: name.into(),
        }
    }
}

/// A to-many attribute plus its association metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionAccessor {
    pub accessor: Accessor,
    pub mapping: ToManyMapping,
}

/// The merge-relevant view of an entity type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub basic: Vec<Accessor>,
    pub single: Vec<Accessor>,
    pub collections: Vec<CollectionAccessor>,
    /// Hooks to run after the merge, root-most type first.
    pub post_load: Vec<Accessor>,
}

impl Classification {
    /// Number of attributes that take part in the merge.
    pub fn attribute_count(&self) -> usize {
        self.basic.len() + self.single.len() + self.collections.len()
    }
}

/// Builds [`Classification`]s from registered schemas.
#[derive(Debug, Clone, Default)]
pub struct MetadataLocator {
    inclusion: InclusionPolicy,
}

impl MetadataLocator {
    pub fn new(inclusion: InclusionPolicy) -> Self {
        Self { inclusion }
    }

    pub fn inclusion(&self) -> &InclusionPolicy {
        &self.inclusion
    }

    /// Classifies every attribute of `entity_type` and its supertypes.
    ///
    /// A field redeclared by a subtype is classified once, using the
    /// most-derived declaration, at the position of its first declaration.
    /// `Id`, `Version`, and `Transient` fields are skipped; so is anything the
    /// inclusion policy rejects. A merged field without a setter is an error.
    pub fn classify(
        &self,
        registry: &SchemaRegistry,
        entity_type: &str,
    ) -> MergeResult<Classification> {
        let lineage = registry.lineage(entity_type)?;

        let mut order: Vec<&str> = Vec::new();
        let mut resolved: HashMap<&str, (&str, &FieldSchema)> = HashMap::new();
        for schema in &lineage {
            for field in &schema.fields {
                if resolved
                    .insert(field.name.as_str(), (schema.entity_type.as_str(), field))
                    .is_none()
                {
                    order.push(field.name.as_str());
                }
            }
        }

        let mut classification = Classification::default();
        for name in order {
            let Some(&(declaring_type, field)) = resolved.get(name) else {
                continue;
            };
            if matches!(
                field.mapping,
                FieldMapping::Id | FieldMapping::Version | FieldMapping::Transient
            ) {
                continue;
            }
            if !self
                .inclusion
                .permits_field(entity_type, declaring_type, name)
            {
                trace!("Excluding {}.{} from merge", declaring_type, name);
                continue;
            }
            if !field.writable {
                return Err(MergeError::MissingSetter {
                    entity_type: declaring_type.into(),
                    accessor: name.into(),
                });
            }

            let accessor = Accessor::new(declaring_type, name);
            match &field.mapping {
                FieldMapping::Guid | FieldMapping::Basic => classification.basic.push(accessor),
                FieldMapping::ToOne { .. } => classification.single.push(accessor),
                FieldMapping::ToMany(mapping) => {
                    classification.collections.push(CollectionAccessor {
                        accessor,
                        mapping: mapping.clone(),
                    });
                }
                FieldMapping::Id | FieldMapping::Version | FieldMapping::Transient => {}
            }
        }

        for schema in &lineage {
            for hook in &schema.post_load {
                classification
                    .post_load
                    .push(Accessor::new(&schema.entity_type, hook));
            }
        }

        trace!(
            "Classified {}: {} basic, {} single, {} collection, {} hooks",
            entity_type,
            classification.basic.len(),
            classification.single.len(),
            classification.collections.len(),
            classification.post_load.len()
        );
        Ok(classification)
    }
}
