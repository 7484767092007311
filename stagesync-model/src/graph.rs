//! In-memory object graphs.
//!
//! An [`ObjectGraph`] is an arena: objects refer to each other by
//! [`ObjectId`], so cycles and shared references need no reference counting.
//! A staging snapshot and a production unit of work are two separate graphs;
//! an `ObjectId` is only meaningful inside the graph that issued it.

use crate::schema::ContainerKind;
use crate::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use stagesync_types::{ObjectId, Value};
use std::collections::BTreeMap;

/// The live value of one attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    /// A basic attribute.
    Value(Value),
    /// A to-one association.
    Ref(Option<ObjectId>),
    /// A to-many association. `None` is a null container, not an empty one.
    Many(Option<Container>),
}

/// A to-many container.
///
/// `Set` keeps insertion order; uniqueness is by schema equality and is
/// enforced by whoever inserts, since the container cannot see the schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "items", rename_all = "snake_case")]
pub enum Container {
    List(Vec<ObjectId>),
    Set(Vec<ObjectId>),
    Map(BTreeMap<String, ObjectId>),
}

impl Container {
    pub fn kind(&self) -> ContainerKind {
        match self {
            Self::List(_) => ContainerKind::List,
            Self::Set(_) => ContainerKind::Set,
            Self::Map(_) => ContainerKind::Map,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::List(items) | Self::Set(items) => items.len(),
            Self::Map(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The elements in container order (map values for a map).
    pub fn elements(&self) -> Vec<ObjectId> {
        match self {
            Self::List(items) | Self::Set(items) => items.clone(),
            Self::Map(entries) => entries.values().copied().collect(),
        }
    }

    /// Identity membership (same handle), not equality.
    pub fn contains(&self, id: ObjectId) -> bool {
        match self {
            Self::List(items) | Self::Set(items) => items.contains(&id),
            Self::Map(entries) => entries.values().any(|v| *v == id),
        }
    }

    pub fn clear(&mut self) {
        match self {
            Self::List(items) | Self::Set(items) => items.clear(),
            Self::Map(entries) => entries.clear(),
        }
    }

    /// Keeps only elements for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(ObjectId) -> bool) {
        match self {
            Self::List(items) | Self::Set(items) => items.retain(|id| keep(*id)),
            Self::Map(entries) => entries.retain(|_, id| keep(*id)),
        }
    }

    pub fn get_key(&self, key: &str) -> Option<ObjectId> {
        match self {
            Self::Map(entries) => entries.get(key).copied(),
            _ => None,
        }
    }
}

/// One object: its runtime type plus named attribute slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Object {
    entity_type: String,
    #[serde(default)]
    slots: BTreeMap<String, Slot>,
}

impl Object {
    pub fn new(entity_type: &str) -> Self {
        Self {
            entity_type: entity_type.into(),
            slots: BTreeMap::new(),
        }
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    #[must_use]
    pub fn with_value(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set(name, Slot::Value(value.into()));
        self
    }

    #[must_use]
    pub fn with_ref(mut self, name: &str, target: Option<ObjectId>) -> Self {
        self.set(name, Slot::Ref(target));
        self
    }

    #[must_use]
    pub fn with_many(mut self, name: &str, container: Option<Container>) -> Self {
        self.set(name, Slot::Many(container));
        self
    }

    pub fn slot(&self, name: &str) -> Option<&Slot> {
        self.slots.get(name)
    }

    pub fn slot_mut(&mut self, name: &str) -> Option<&mut Slot> {
        self.slots.get_mut(name)
    }

    pub fn set(&mut self, name: &str, slot: Slot) {
        self.slots.insert(name.to_string(), slot);
    }

    pub fn slots(&self) -> impl Iterator<Item = (&str, &Slot)> {
        self.slots.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The basic value of `name`, or `None` if absent or not a basic slot.
    pub fn value(&self, name: &str) -> Option<&Value> {
        match self.slots.get(name) {
            Some(Slot::Value(v)) => Some(v),
            _ => None,
        }
    }

    /// The to-one target of `name`, or `None` if null, absent, or not a reference.
    pub fn reference(&self, name: &str) -> Option<ObjectId> {
        match self.slots.get(name) {
            Some(Slot::Ref(target)) => *target,
            _ => None,
        }
    }

    /// The to-many container of `name`, or `None` if null, absent, or not a container.
    pub fn container(&self, name: &str) -> Option<&Container> {
        match self.slots.get(name) {
            Some(Slot::Many(container)) => container.as_ref(),
            _ => None,
        }
    }

    pub fn container_mut(&mut self, name: &str) -> Option<&mut Container> {
        match self.slots.get_mut(name) {
            Some(Slot::Many(container)) => container.as_mut(),
            _ => None,
        }
    }
}

/// An arena of objects.
///
/// Discarded objects leave a hole so that outstanding handles never alias a
/// different object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectGraph {
    objects: Vec<Option<Object>>,
}

impl ObjectGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a graph snapshot.
    pub fn from_json(json: &str) -> ModelResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the graph as a snapshot.
    pub fn to_json(&self) -> ModelResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn insert(&mut self, object: Object) -> ObjectId {
        let index = u32::try_from(self.objects.len()).unwrap_or(u32::MAX);
        self.objects.push(Some(object));
        ObjectId::from_index(index)
    }

    pub fn get(&self, id: ObjectId) -> Option<&Object> {
        self.objects.get(id.index()).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut Object> {
        self.objects.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Like [`get`](Self::get) but fails with `MissingObject`.
    pub fn object(&self, id: ObjectId) -> ModelResult<&Object> {
        self.get(id).ok_or(ModelError::MissingObject(id))
    }

    /// Like [`get_mut`](Self::get_mut) but fails with `MissingObject`.
    pub fn object_mut(&mut self, id: ObjectId) -> ModelResult<&mut Object> {
        self.get_mut(id).ok_or(ModelError::MissingObject(id))
    }

    /// Removes an object, returning it. References to it are left dangling.
    pub fn discard(&mut self, id: ObjectId) -> Option<Object> {
        self.objects.get_mut(id.index()).and_then(Option::take)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.objects.iter().filter(|o| o.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.iter().map(|(id, _)| id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &Object)> {
        self.objects.iter().enumerate().filter_map(|(i, o)| {
            let index = u32::try_from(i).ok()?;
            o.as_ref().map(|obj| (ObjectId::from_index(index), obj))
        })
    }

    /// First live object matching `predicate`.
    pub fn find(&self, mut predicate: impl FnMut(&Object) -> bool) -> Option<ObjectId> {
        self.iter().find(|(_, o)| predicate(o)).map(|(id, _)| id)
    }
}

impl From<ContainerKind> for Container {
    fn from(kind: ContainerKind) -> Self {
        kind.empty()
    }
}
