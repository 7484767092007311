//! Merge orchestrator.
//!
//! Walks the source graph depth-first and replays it onto the target graph:
//! basic attributes are copied, single-valued associations are recursed into
//! or re-resolved, and collections are handed to the reconciler.

use crate::boundary::BoundarySpec;
use crate::config::MergeConfig;
use crate::factory::{ObjectFactory, SchemaObjectFactory};
use crate::filter::MergeFilters;
use crate::inclusion::InclusionPolicy;
use crate::locator::{EntityLocator, GraphEntityLocator, GuidLocator};
use crate::map_key::{FieldMapKeyExtractor, MapKeyExtractor};
use crate::metadata::{Accessor, Classification, MetadataLocator};
use crate::session::{MergeSession, MergeStats};
use crate::value_object::{FieldwiseValueObjectMerger, ValueObjectMerger};
use crate::{MergeError, MergeResult};
use stagesync_model::{ObjectGraph, SchemaRegistry, Slot};
use stagesync_types::{ObjectId, Value};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// How a source entity is looked up in the target store.
#[derive(Debug, Clone, Copy)]
enum Lookup {
    /// A reference-only entity.
    Reference,
    /// A collection element excluded by a merge filter.
    Unmergeable,
}

/// Replays source object graphs onto target object graphs.
///
/// Configuration is immutable once built. `merge` takes `&self`, so one engine
/// can be shared across threads; each call owns its own session.
pub struct MergeEngine {
    pub(crate) registry: Arc<SchemaRegistry>,
    pub(crate) metadata: MetadataLocator,
    pub(crate) boundaries: BoundarySpec,
    pub(crate) filters: MergeFilters,
    pub(crate) guids: GuidLocator,
    pub(crate) locator: Arc<dyn EntityLocator>,
    pub(crate) factory: Arc<dyn ObjectFactory>,
    pub(crate) value_objects: Arc<dyn ValueObjectMerger>,
    pub(crate) map_keys: Arc<dyn MapKeyExtractor>,
}

impl fmt::Debug for MergeEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MergeEngine")
            .field("registry", &self.registry)
            .field("inclusion", self.metadata.inclusion())
            .field("boundaries", &self.boundaries)
            .field("filters", &self.filters)
            .finish_non_exhaustive()
    }
}

impl MergeEngine {
    /// An engine that deep-merges everything, resolving references against
    /// the target graph itself.
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self {
            registry,
            metadata: MetadataLocator::default(),
            boundaries: BoundarySpec::default(),
            filters: MergeFilters::default(),
            guids: GuidLocator,
            locator: Arc::new(GraphEntityLocator),
            factory: Arc::new(SchemaObjectFactory),
            value_objects: Arc::new(FieldwiseValueObjectMerger::new()),
            map_keys: Arc::new(FieldMapKeyExtractor),
        }
    }

    /// Builds an engine from a configuration document.
    pub fn from_config(registry: Arc<SchemaRegistry>, config: &MergeConfig) -> Self {
        let value_objects = match &config.value_objects {
            Some(types) => FieldwiseValueObjectMerger::for_types(types.iter().map(String::as_str)),
            None => FieldwiseValueObjectMerger::new(),
        };
        Self::new(registry)
            .with_boundaries(config.boundaries.clone())
            .with_inclusion(config.inclusion.clone())
            .with_filters(config.merge_filters())
            .with_value_object_merger(value_objects)
    }

    #[must_use]
    pub fn with_boundaries(mut self, boundaries: BoundarySpec) -> Self {
        self.boundaries = boundaries;
        self
    }

    #[must_use]
    pub fn with_inclusion(mut self, inclusion: InclusionPolicy) -> Self {
        self.metadata = MetadataLocator::new(inclusion);
        self
    }

    #[must_use]
    pub fn with_filters(mut self, filters: MergeFilters) -> Self {
        self.filters = filters;
        self
    }

    #[must_use]
    pub fn with_locator(mut self, locator: impl EntityLocator + 'static) -> Self {
        self.locator = Arc::new(locator);
        self
    }

    #[must_use]
    pub fn with_factory(mut self, factory: impl ObjectFactory + 'static) -> Self {
        self.factory = Arc::new(factory);
        self
    }

    #[must_use]
    pub fn with_value_object_merger(mut self, merger: impl ValueObjectMerger + 'static) -> Self {
        self.value_objects = Arc::new(merger);
        self
    }

    #[must_use]
    pub fn with_map_key_extractor(mut self, extractor: impl MapKeyExtractor + 'static) -> Self {
        self.map_keys = Arc::new(extractor);
        self
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// The classification the engine uses for `entity_type`.
    pub fn classify(&self, entity_type: &str) -> MergeResult<Classification> {
        self.metadata.classify(&self.registry, entity_type)
    }

    /// Merges `source_root` onto `target_root`, mutating `target` in place.
    ///
    /// Both roots must be of the same entity type. The first failure aborts
    /// the call; the target may then be partially merged and should not be
    /// committed.
    pub fn merge(
        &self,
        source: &ObjectGraph,
        source_root: ObjectId,
        target: &mut ObjectGraph,
        target_root: ObjectId,
    ) -> MergeResult<MergeStats> {
        let root_type = self.sanity_check(source, source_root, target, target_root)?;
        let boundary = self.boundaries.initialize(&self.registry, &root_type);
        let mut session = MergeSession::new(boundary);

        debug!("Merging {} {} onto {}", root_type, source_root, target_root);
        self.merge_internal(&mut session, source, source_root, target, target_root)?;

        let stats = session.stats;
        info!(
            "Merged {} root {}: {} merged, {} created, {} resolved, {} detached, {} value-merged",
            root_type,
            source_root,
            stats.merged,
            stats.created,
            stats.resolved,
            stats.detached,
            stats.value_merged
        );
        Ok(stats)
    }

    /// Both objects exist and share a runtime type, which is returned.
    fn sanity_check(
        &self,
        source: &ObjectGraph,
        source_object: ObjectId,
        target: &ObjectGraph,
        target_object: ObjectId,
    ) -> MergeResult<String> {
        let source_type = source.object(source_object)?.entity_type();
        let target_type = target.object(target_object)?.entity_type();
        if source_type != target_type {
            return Err(MergeError::TypeMismatch {
                source_type: source_type.into(),
                target_type: target_type.into(),
            });
        }
        Ok(source_type.to_string())
    }

    pub(crate) fn merge_internal(
        &self,
        session: &mut MergeSession,
        source: &ObjectGraph,
        source_object: ObjectId,
        target: &mut ObjectGraph,
        target_object: ObjectId,
    ) -> MergeResult<()> {
        let entity_type = self.sanity_check(source, source_object, target, target_object)?;
        session.cycles.register(source_object, target_object);
        session.stats.merged += 1;

        let classification = session.classification(&self.metadata, &self.registry, &entity_type)?;
        debug!(
            "Merging {} {} onto {} ({} attributes)",
            entity_type,
            source_object,
            target_object,
            classification.attribute_count()
        );

        for accessor in &classification.basic {
            self.resolve_basic_attribute(source, source_object, target, target_object, accessor)?;
        }
        for accessor in &classification.single {
            self.resolve_single_association(
                session,
                source,
                source_object,
                target,
                target_object,
                accessor,
            )?;
        }
        for collection in &classification.collections {
            self.resolve_collection_association(
                session,
                source,
                source_object,
                target,
                target_object,
                collection,
            )?;
        }
        for hook in &classification.post_load {
            self.registry
                .run_hook(&hook.declaring_type, &hook.name, target, target_object)?;
        }
        Ok(())
    }

    fn resolve_basic_attribute(
        &self,
        source: &ObjectGraph,
        source_object: ObjectId,
        target: &mut ObjectGraph,
        target_object: ObjectId,
        accessor: &Accessor,
    ) -> MergeResult<()> {
        let object = source.object(source_object)?;
        let value = match object.slot(&accessor.name) {
            None => Value::Null,
            Some(Slot::Value(value)) => value.clone(),
            Some(other) => {
                return Err(MergeError::SlotShape {
                    entity_type: object.entity_type().into(),
                    accessor: accessor.name.clone(),
                    expected: "value",
                    found: slot_kind(other),
                });
            }
        };
        target
            .object_mut(target_object)?
            .set(&accessor.name, Slot::Value(value));
        Ok(())
    }

    fn resolve_single_association(
        &self,
        session: &mut MergeSession,
        source: &ObjectGraph,
        source_object: ObjectId,
        target: &mut ObjectGraph,
        target_object: ObjectId,
        accessor: &Accessor,
    ) -> MergeResult<()> {
        let Some(source_value) = read_reference(source, source_object, accessor)? else {
            set_reference(target, target_object, accessor, None)?;
            return Ok(());
        };

        if let Some(linked) = session.cycles.target_of(source_value) {
            set_reference(target, target_object, accessor, Some(linked))?;
            return Ok(());
        }

        let value_type = source.object(source_value)?.entity_type().to_string();
        let existing = read_reference(target, target_object, accessor)?;

        if session.boundary.stop_merging(&self.registry, &value_type) {
            let unchanged = existing.is_some_and(|current| {
                self.guids
                    .same_identity(&self.registry, target, current, source, source_value)
            });
            if !unchanged {
                let fresh = self.retrieve_fresh_reference(session, source, source_value, target)?;
                set_reference(target, target_object, accessor, Some(fresh))?;
            }
            return Ok(());
        }

        let target_value = match existing {
            Some(current) => current,
            None => {
                let created = self.factory.create(&self.registry, target, &value_type)?;
                session.stats.created += 1;
                set_reference(target, target_object, accessor, Some(created))?;
                created
            }
        };
        self.merge_internal(session, source, source_value, target, target_value)
    }

    /// Resolves a reference-only source entity to its target-store object.
    pub(crate) fn retrieve_fresh_reference(
        &self,
        session: &mut MergeSession,
        source: &ObjectGraph,
        source_value: ObjectId,
        target: &mut ObjectGraph,
    ) -> MergeResult<ObjectId> {
        self.retrieve(session, source, source_value, target, Lookup::Reference)
    }

    /// Resolves a filtered collection element to its target-store object.
    pub(crate) fn retrieve_unmergeable(
        &self,
        session: &mut MergeSession,
        source: &ObjectGraph,
        source_value: ObjectId,
        target: &mut ObjectGraph,
    ) -> MergeResult<ObjectId> {
        self.retrieve(session, source, source_value, target, Lookup::Unmergeable)
    }

    fn retrieve(
        &self,
        session: &mut MergeSession,
        source: &ObjectGraph,
        source_value: ObjectId,
        target: &mut ObjectGraph,
        lookup: Lookup,
    ) -> MergeResult<ObjectId> {
        let entity_type = source.object(source_value)?.entity_type();
        let guid = self
            .guids
            .identity_of(&self.registry, source, source_value)
            .ok_or_else(|| MergeError::MissingGuid {
                entity_type: entity_type.into(),
                object: source_value,
            })?;

        let found = match lookup {
            Lookup::Reference => {
                self.locator
                    .locate_reference(&self.registry, target, entity_type, &guid)?
            }
            Lookup::Unmergeable => self.locator.locate(&self.registry, target, entity_type, &guid)?,
        };
        let Some(found) = found else {
            return Err(MergeError::EntityNotFound {
                entity_type: entity_type.into(),
                guid,
            });
        };

        debug!("Resolved {} {} to {} ({:?})", entity_type, guid, found, lookup);
        session.stats.resolved += 1;
        Ok(found)
    }
}

/// Short name of a slot's shape, for error messages.
pub(crate) fn slot_kind(slot: &Slot) -> &'static str {
    match slot {
        Slot::Value(_) => "value",
        Slot::Ref(_) => "reference",
        Slot::Many(_) => "collection",
    }
}

fn read_reference(
    graph: &ObjectGraph,
    object: ObjectId,
    accessor: &Accessor,
) -> MergeResult<Option<ObjectId>> {
    let obj = graph.object(object)?;
    match obj.slot(&accessor.name) {
        None => Ok(None),
        Some(Slot::Ref(reference)) => Ok(*reference),
        Some(other) => Err(MergeError::SlotShape {
            entity_type: obj.entity_type().into(),
            accessor: accessor.name.clone(),
            expected: "reference",
            found: slot_kind(other),
        }),
    }
}

fn set_reference(
    graph: &mut ObjectGraph,
    object: ObjectId,
    accessor: &Accessor,
    value: Option<ObjectId>,
) -> MergeResult<()> {
    graph.object_mut(object)?.set(&accessor.name, Slot::Ref(value));
    Ok(())
}
