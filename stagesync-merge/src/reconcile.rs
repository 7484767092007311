//! Collection reconciler.
//!
//! A to-many association is either refreshed (its element type is
//! reference-only, so every element is re-resolved against the target store)
//! or reconciled: elements matched by GUID are deep-merged in place, new ones
//! are created and added, and whatever the source no longer holds is removed.

use crate::engine::{slot_kind, MergeEngine};
use crate::metadata::{Accessor, CollectionAccessor};
use crate::session::MergeSession;
use crate::{MergeError, MergeResult};
use stagesync_model::{Container, ContainerKind, ObjectGraph, SchemaRegistry, Slot};
use stagesync_types::ObjectId;
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Target elements not yet matched by any source element.
///
/// Seeded with the live container; whatever is still pending once every
/// source element is processed gets removed.
#[derive(Debug, Clone, Default)]
pub(crate) struct RemovalList {
    pending: Vec<ObjectId>,
}

impl RemovalList {
    pub(crate) fn seed(container: &Container) -> Self {
        Self {
            pending: container.elements(),
        }
    }

    /// Strikes `element` itself. Returns whether it was pending.
    pub(crate) fn remove_identical(&mut self, element: ObjectId) -> bool {
        match self.pending.iter().position(|p| *p == element) {
            Some(index) => {
                self.pending.remove(index);
                true
            }
            None => false,
        }
    }

    /// Strikes the first pending element equal to `element`.
    pub(crate) fn remove_equal(
        &mut self,
        registry: &SchemaRegistry,
        graph: &ObjectGraph,
        element: ObjectId,
    ) -> bool {
        let position = self
            .pending
            .iter()
            .position(|p| *p != element && registry.objects_equal(graph, *p, graph, element));
        match position {
            Some(index) => {
                self.pending.remove(index);
                true
            }
            None => false,
        }
    }

    pub(crate) fn pending(&self) -> &[ObjectId] {
        &self.pending
    }

    /// Removes every pending element from `container`, returning the count.
    pub(crate) fn remove_surplus(&self, container: &mut Container) -> usize {
        let before = container.len();
        container.retain(|element| !self.pending.contains(&element));
        before - container.len()
    }
}

/// What happened to one source element during reconciliation.
#[derive(Debug, Clone, Copy)]
enum ElementOutcome {
    /// Deep-merged onto this existing target element.
    Merged(ObjectId),
    /// Already attached; nothing to add.
    Kept,
    /// To be added to the live container.
    Staged(Staged),
}

#[derive(Debug, Clone, Copy)]
struct Staged {
    source: ObjectId,
    element: ObjectId,
    /// Created during this reconciliation, so it may be discarded.
    fresh: bool,
}

impl MergeEngine {
    pub(crate) fn resolve_collection_association(
        &self,
        session: &mut MergeSession,
        source: &ObjectGraph,
        source_object: ObjectId,
        target: &mut ObjectGraph,
        target_object: ObjectId,
        collection: &CollectionAccessor,
    ) -> MergeResult<()> {
        let accessor = &collection.accessor;
        let object = source.object(source_object)?;
        let source_container = match object.slot(&accessor.name) {
            None | Some(Slot::Many(None)) => None,
            Some(Slot::Many(Some(container))) => Some(container),
            Some(other) => {
                return Err(MergeError::UnexpectedCollectionType {
                    entity_type: object.entity_type().into(),
                    accessor: accessor.name.clone(),
                    found: slot_kind(other).into(),
                });
            }
        };

        let Some(source_container) = source_container else {
            target
                .object_mut(target_object)?
                .set(&accessor.name, Slot::Many(None));
            return Ok(());
        };

        ensure_container(target, target_object, accessor, source_container.kind())?;

        if self.should_not_merge_collection(session, collection)? {
            return self.refresh_collection(session, source, source_container, target, target_object, collection);
        }

        debug!(
            "Reconciling {}.{} ({} source elements)",
            accessor.declaring_type,
            accessor.name,
            source_container.len()
        );
        match source_container {
            Container::List(items) | Container::Set(items) => {
                self.merge_sequence(session, source, items, target, target_object, collection)
            }
            Container::Map(entries) => {
                self.merge_map(session, source, entries, target, target_object, collection)
            }
        }
    }

    /// Whether the association's element type lies outside the boundary.
    fn should_not_merge_collection(
        &self,
        session: &MergeSession,
        collection: &CollectionAccessor,
    ) -> MergeResult<bool> {
        let element_type = collection.mapping.target.as_deref().ok_or_else(|| {
            MergeError::UndeclaredCollectionTarget {
                entity_type: collection.accessor.declaring_type.clone(),
                accessor: collection.accessor.name.clone(),
            }
        })?;
        Ok(session.boundary.stop_merging(&self.registry, element_type))
    }

    /// Replaces the live container's contents with the target-store
    /// counterparts of every source element.
    fn refresh_collection(
        &self,
        session: &mut MergeSession,
        source: &ObjectGraph,
        source_container: &Container,
        target: &mut ObjectGraph,
        target_object: ObjectId,
        collection: &CollectionAccessor,
    ) -> MergeResult<()> {
        let mut resolved = Vec::with_capacity(source_container.len());
        for element in source_container.elements() {
            let fresh = self.retrieve_fresh_reference(session, source, element, target)?;
            let key = match source_container.kind() {
                ContainerKind::Map => Some(self.map_keys.key_of(&self.registry, target, collection, fresh)?),
                ContainerKind::List | ContainerKind::Set => None,
            };
            resolved.push((key, fresh));
        }

        let live = live_container(target, target_object, &collection.accessor)?;
        let previous = live.len();
        live.clear();
        for (key, element) in resolved {
            attach(live, key, element);
        }
        trace!(
            "Refreshed {}.{}: {} -> {} elements",
            collection.accessor.declaring_type,
            collection.accessor.name,
            previous,
            live.len()
        );
        Ok(())
    }

    fn merge_sequence(
        &self,
        session: &mut MergeSession,
        source: &ObjectGraph,
        items: &[ObjectId],
        target: &mut ObjectGraph,
        target_object: ObjectId,
        collection: &CollectionAccessor,
    ) -> MergeResult<()> {
        let accessor = &collection.accessor;
        let mut removals = RemovalList::seed(live_container(target, target_object, accessor)?);

        let mut staged = Vec::new();
        for &element in items {
            let outcome = self.merge_collection_element(
                session,
                &mut removals,
                source,
                element,
                target,
                target_object,
                accessor,
            )?;
            if let ElementOutcome::Staged(addition) = outcome {
                staged.push(addition);
            }
        }

        for addition in staged {
            self.add_to_sequence(session, target, target_object, accessor, addition)?;
        }

        trace!(
            "{} surplus elements in {}.{}",
            removals.pending().len(),
            accessor.declaring_type,
            accessor.name
        );
        let live = live_container(target, target_object, accessor)?;
        session.stats.detached += removals.remove_surplus(live);
        Ok(())
    }

    fn add_to_sequence(
        &self,
        session: &mut MergeSession,
        target: &mut ObjectGraph,
        target_object: ObjectId,
        accessor: &Accessor,
        addition: Staged,
    ) -> MergeResult<()> {
        let live = live_container(target, target_object, accessor)?;
        if live.contains(addition.element) {
            return Ok(());
        }
        let is_set = live.kind() == ContainerKind::Set;
        let elements = live.elements();

        let element_type = target.object(addition.element)?.entity_type().to_string();
        let equal = elements
            .into_iter()
            .find(|&e| self.registry.objects_equal(target, e, target, addition.element));

        if let Some(existing) = equal {
            if addition.fresh && self.value_objects.is_merge_required(&self.registry, &element_type) {
                self.value_objects
                    .merge(&self.registry, target, addition.element, existing)?;
                session.stats.value_merged += 1;
                discard_staged(session, target, addition, existing);
                return Ok(());
            }
            if is_set {
                if addition.fresh {
                    discard_staged(session, target, addition, existing);
                }
                return Ok(());
            }
        }

        attach(live_container(target, target_object, accessor)?, None, addition.element);
        Ok(())
    }

    fn merge_map(
        &self,
        session: &mut MergeSession,
        source: &ObjectGraph,
        entries: &BTreeMap<String, ObjectId>,
        target: &mut ObjectGraph,
        target_object: ObjectId,
        collection: &CollectionAccessor,
    ) -> MergeResult<()> {
        let accessor = &collection.accessor;
        let mut removals = RemovalList::seed(live_container(target, target_object, accessor)?);

        let mut merged = Vec::new();
        let mut staged = Vec::new();
        for &element in entries.values() {
            match self.merge_collection_element(
                session,
                &mut removals,
                source,
                element,
                target,
                target_object,
                accessor,
            )? {
                ElementOutcome::Merged(existing) => merged.push(existing),
                ElementOutcome::Kept => {}
                ElementOutcome::Staged(addition) => staged.push(addition),
            }
        }

        for addition in staged {
            let key = self
                .map_keys
                .key_of(&self.registry, target, collection, addition.element)?;
            let current = live_container(target, target_object, accessor)?.get_key(&key);
            match current {
                Some(existing) if existing == addition.element => continue,
                Some(existing)
                    if addition.fresh
                        && self.is_value_merge(target, addition.element)
                        && self.registry.objects_equal(target, existing, target, addition.element) =>
                {
                    self.value_objects
                        .merge(&self.registry, target, addition.element, existing)?;
                    session.stats.value_merged += 1;
                    discard_staged(session, target, addition, existing);
                    removals.remove_identical(existing);
                    continue;
                }
                _ => {}
            }
            if let Container::Map(map) = live_container(target, target_object, accessor)? {
                if map.insert(key, addition.element).is_some() {
                    session.stats.detached += 1;
                }
            }
        }

        let live = live_container(target, target_object, accessor)?;
        session.stats.detached += removals.remove_surplus(live);

        // Elements merged in place may have changed the field they are keyed by.
        let mut rekeyed = Vec::new();
        for element in merged {
            let key = self.map_keys.key_of(&self.registry, target, collection, element)?;
            rekeyed.push((key, element));
        }
        if let Container::Map(map) = live_container(target, target_object, accessor)? {
            for (key, element) in rekeyed {
                if map.get(&key) == Some(&element) {
                    continue;
                }
                map.retain(|_, id| *id != element);
                map.insert(key, element);
            }
        }
        Ok(())
    }

    fn is_value_merge(&self, target: &ObjectGraph, element: ObjectId) -> bool {
        target.get(element).is_some_and(|object| {
            self.value_objects
                .is_merge_required(&self.registry, object.entity_type())
        })
    }

    /// Matches one source element against the live container.
    #[allow(clippy::too_many_arguments)]
    fn merge_collection_element(
        &self,
        session: &mut MergeSession,
        removals: &mut RemovalList,
        source: &ObjectGraph,
        element: ObjectId,
        target: &mut ObjectGraph,
        target_object: ObjectId,
        accessor: &Accessor,
    ) -> MergeResult<ElementOutcome> {
        let element_type = source.object(element)?.entity_type().to_string();
        let mergeable = self.filters.is_mergeable(&self.registry, source, element);
        let by_guid = mergeable && self.guids.can_qualify_by_guid(&self.registry, &element_type);

        if let Some(linked) = session.cycles.target_of(element) {
            removals.remove_identical(linked);
            let live = live_container(target, target_object, accessor)?;
            if live.contains(linked) {
                return Ok(ElementOutcome::Kept);
            }
            // Reached earlier through another association; the live container
            // may still hold its own copy of the same entity.
            let candidates: Vec<ObjectId> = live
                .elements()
                .into_iter()
                .filter(|candidate| !session.cycles.maps_to(*candidate))
                .collect();
            let matched = if by_guid {
                self.identity_match(source, element, target, &candidates)
            } else {
                None
            };
            if let Some(matched) = matched {
                self.merge_internal(session, source, element, target, matched)?;
                removals.remove_identical(matched);
                return Ok(ElementOutcome::Merged(matched));
            }
            return Ok(ElementOutcome::Staged(Staged {
                source: element,
                element: linked,
                fresh: false,
            }));
        }

        if by_guid {
            let candidates = live_container(target, target_object, accessor)?.elements();
            if let Some(matched) = self.identity_match(source, element, target, &candidates) {
                self.merge_internal(session, source, element, target, matched)?;
                removals.remove_identical(matched);
                return Ok(ElementOutcome::Merged(matched));
            }
        }

        if mergeable {
            let created = self.factory.create(&self.registry, target, &element_type)?;
            session.stats.created += 1;
            self.merge_internal(session, source, element, target, created)?;
            removals.remove_equal(&self.registry, target, created);
            return Ok(ElementOutcome::Staged(Staged {
                source: element,
                element: created,
                fresh: true,
            }));
        }

        let located = self.retrieve_unmergeable(session, source, element, target)?;
        let present = removals.remove_identical(located)
            || live_container(target, target_object, accessor)?.contains(located);
        if present {
            return Ok(ElementOutcome::Kept);
        }
        Ok(ElementOutcome::Staged(Staged {
            source: element,
            element: located,
            fresh: false,
        }))
    }
}

impl MergeEngine {
    /// First candidate sharing `element`'s GUID.
    fn identity_match(
        &self,
        source: &ObjectGraph,
        element: ObjectId,
        target: &ObjectGraph,
        candidates: &[ObjectId],
    ) -> Option<ObjectId> {
        candidates.iter().copied().find(|&candidate| {
            self.guids
                .same_identity(&self.registry, target, candidate, source, element)
        })
    }
}

/// Makes sure the target holds a live container of `kind`.
fn ensure_container(
    target: &mut ObjectGraph,
    target_object: ObjectId,
    accessor: &Accessor,
    kind: ContainerKind,
) -> MergeResult<()> {
    let object = target.object_mut(target_object)?;
    let current = match object.slot(&accessor.name) {
        None | Some(Slot::Many(None)) => Ok(None),
        Some(Slot::Many(Some(container))) => Ok(Some(container.kind())),
        Some(other) => Err(slot_kind(other).to_string()),
    };
    let found = match current {
        Ok(None) => {
            object.set(&accessor.name, Slot::Many(Some(kind.empty())));
            return Ok(());
        }
        Ok(Some(live)) if live == kind => return Ok(()),
        Ok(Some(live)) => format!("{live:?} where the source holds a {kind:?}"),
        Err(found) => found,
    };
    Err(MergeError::UnexpectedCollectionType {
        entity_type: object.entity_type().into(),
        accessor: accessor.name.clone(),
        found,
    })
}

fn live_container<'a>(
    target: &'a mut ObjectGraph,
    target_object: ObjectId,
    accessor: &Accessor,
) -> MergeResult<&'a mut Container> {
    let object = target.object_mut(target_object)?;
    let entity_type = object.entity_type().to_string();
    object
        .container_mut(&accessor.name)
        .ok_or_else(|| MergeError::UnexpectedCollectionType {
            entity_type,
            accessor: accessor.name.clone(),
            found: "null container".into(),
        })
}

fn attach(live: &mut Container, key: Option<String>, element: ObjectId) {
    match live {
        Container::List(items) => items.push(element),
        Container::Set(items) => {
            if !items.contains(&element) {
                items.push(element);
            }
        }
        Container::Map(entries) => {
            if let Some(key) = key {
                entries.insert(key, element);
            }
        }
    }
}

/// Drops a fresh element that was folded into `existing`.
fn discard_staged(session: &mut MergeSession, target: &mut ObjectGraph, addition: Staged, existing: ObjectId) {
    session.cycles.register(addition.source, existing);
    if addition.fresh {
        target.discard(addition.element);
    }
}
