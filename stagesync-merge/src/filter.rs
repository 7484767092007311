//! Per-type merge filters.
//!
//! A filtered collection element is not deep-merged. It is resolved against
//! the target store instead and must already exist there.

use serde::{Deserialize, Serialize};
use stagesync_model::{ObjectGraph, SchemaRegistry};
use stagesync_types::{ObjectId, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Decides whether one source object is excluded from deep merging.
pub trait EntityFilter: Send + Sync {
    fn is_filtered(&self, registry: &SchemaRegistry, graph: &ObjectGraph, object: ObjectId) -> bool;
}

/// Filters objects whose basic field equals a fixed value.
///
/// An absent field reads as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldEqualsFilter {
    pub entity_type: String,
    pub field: String,
    pub equals: Value,
}

impl FieldEqualsFilter {
    pub fn new(entity_type: &str, field: &str, equals: impl Into<Value>) -> Self {
        Self {
            entity_type: entity_type.into(),
            field: field.into(),
            equals: equals.into(),
        }
    }
}

impl EntityFilter for FieldEqualsFilter {
    fn is_filtered(&self, _registry: &SchemaRegistry, graph: &ObjectGraph, object: ObjectId) -> bool {
        let Some(obj) = graph.get(object) else {
            return false;
        };
        let value = obj.value(&self.field).unwrap_or(&Value::Null);
        *value == self.equals
    }
}

/// Filters keyed by exact runtime type.
#[derive(Clone, Default)]
pub struct MergeFilters {
    filters: HashMap<String, Vec<Arc<dyn EntityFilter>>>,
}

impl fmt::Debug for MergeFilters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<_> = self.filters.keys().collect();
        types.sort();
        f.debug_struct("MergeFilters").field("types", &types).finish()
    }
}

impl MergeFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, entity_type: &str, filter: impl EntityFilter + 'static) {
        self.filters
            .entry(entity_type.to_string())
            .or_default()
            .push(Arc::new(filter));
    }

    #[must_use]
    pub fn with(mut self, entity_type: &str, filter: impl EntityFilter + 'static) -> Self {
        self.add(entity_type, filter);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// False when any filter registered for the object's type rejects it.
    pub fn is_mergeable(&self, registry: &SchemaRegistry, graph: &ObjectGraph, object: ObjectId) -> bool {
        let Some(obj) = graph.get(object) else {
            return true;
        };
        self.filters
            .get(obj.entity_type())
            .is_none_or(|filters| !filters.iter().any(|f| f.is_filtered(registry, graph, object)))
    }
}
