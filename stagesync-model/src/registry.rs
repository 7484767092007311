//! Schema registry: the runtime metadata source for every entity type.

use crate::schema::{EntitySchema, FieldMapping};
use crate::{LifecycleHook, ModelError, ModelResult, ObjectGraph};
use stagesync_types::{ObjectId, Value};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Maps entity type names to schemas and hook names to implementations.
///
/// Built once at startup, then shared read-only (usually behind an `Arc`).
#[derive(Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, EntitySchema>,
    hooks: HashMap<(String, String), Arc<dyn LifecycleHook>>,
}

impl fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut hooks: Vec<_> = self.hooks.keys().collect();
        hooks.sort();
        f.debug_struct("SchemaRegistry")
            .field("schemas", &self.schemas.keys().collect::<Vec<_>>())
            .field("hooks", &hooks)
            .finish()
    }
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a JSON array of schemas.
    pub fn from_json(json: &str) -> ModelResult<Self> {
        let schemas: Vec<EntitySchema> = serde_json::from_str(json)?;
        let mut registry = Self::new();
        for schema in schemas {
            registry.register(schema);
        }
        Ok(registry)
    }

    /// Registers (or replaces) a schema.
    pub fn register(&mut self, schema: EntitySchema) {
        debug!(
            "Registering schema {} ({} fields)",
            schema.entity_type,
            schema.fields.len()
        );
        self.schemas.insert(schema.entity_type.clone(), schema);
    }

    #[must_use]
    pub fn with_schema(mut self, schema: EntitySchema) -> Self {
        self.register(schema);
        self
    }

    /// Registers the implementation of hook `name` declared on `entity_type`.
    pub fn register_hook(
        &mut self,
        entity_type: &str,
        name: &str,
        hook: impl LifecycleHook + 'static,
    ) {
        self.hooks
            .insert((entity_type.into(), name.into()), Arc::new(hook));
    }

    #[must_use]
    pub fn with_hook(
        mut self,
        entity_type: &str,
        name: &str,
        hook: impl LifecycleHook + 'static,
    ) -> Self {
        self.register_hook(entity_type, name, hook);
        self
    }

    pub fn schema(&self, entity_type: &str) -> Option<&EntitySchema> {
        self.schemas.get(entity_type)
    }

    /// Like [`schema`](Self::schema) but fails with `UnknownType`.
    pub fn require(&self, entity_type: &str) -> ModelResult<&EntitySchema> {
        self.schema(entity_type)
            .ok_or_else(|| ModelError::UnknownType(entity_type.into()))
    }

    pub fn entity_types(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    /// The supertype chain of `entity_type`, root-most first, ending with
    /// `entity_type` itself.
    pub fn lineage(&self, entity_type: &str) -> ModelResult<Vec<&EntitySchema>> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(entity_type);
        while let Some(name) = current {
            if !seen.insert(name) {
                return Err(ModelError::InheritanceCycle(name.into()));
            }
            let schema = self.require(name)?;
            chain.push(schema);
            current = schema.extends.as_deref();
        }
        chain.reverse();
        Ok(chain)
    }

    /// True when `entity_type` is `ancestor` or inherits from it.
    /// Unknown types are never related to anything but themselves.
    pub fn is_a(&self, entity_type: &str, ancestor: &str) -> bool {
        if entity_type == ancestor {
            return true;
        }
        self.lineage(entity_type)
            .map(|chain| chain.iter().any(|s| s.entity_type == ancestor))
            .unwrap_or(false)
    }

    /// Name of the GUID field, searching the most-derived declaration first.
    pub fn identity_field(&self, entity_type: &str) -> Option<&str> {
        let chain = self.lineage(entity_type).ok()?;
        chain
            .iter()
            .rev()
            .find_map(|s| s.guid_field())
            .map(|f| f.name.as_str())
    }

    /// The GUID of an object, if its type has one and it is set.
    pub fn guid_of(&self, graph: &ObjectGraph, id: ObjectId) -> Option<String> {
        let object = graph.get(id)?;
        let field = self.identity_field(object.entity_type())?;
        object.value(field).and_then(Value::to_key)
    }

    /// Equality as the domain defines it, across two (possibly different) graphs.
    ///
    /// - Types carrying a GUID are equal when the type and GUID match.
    /// - Value objects compare their natural key, or every basic field when
    ///   no natural key is declared.
    pub fn objects_equal(
        &self,
        graph_a: &ObjectGraph,
        a: ObjectId,
        graph_b: &ObjectGraph,
        b: ObjectId,
    ) -> bool {
        let (Some(obj_a), Some(obj_b)) = (graph_a.get(a), graph_b.get(b)) else {
            return false;
        };
        if obj_a.entity_type() != obj_b.entity_type() {
            return false;
        }
        let entity_type = obj_a.entity_type();

        if self.identity_field(entity_type).is_some() {
            return match (self.guid_of(graph_a, a), self.guid_of(graph_b, b)) {
                (Some(ga), Some(gb)) => ga == gb,
                _ => false,
            };
        }

        let null = Value::Null;
        self.equality_fields(entity_type).iter().all(|field| {
            let va = obj_a.value(field).unwrap_or(&null);
            let vb = obj_b.value(field).unwrap_or(&null);
            va == vb
        })
    }

    fn equality_fields(&self, entity_type: &str) -> Vec<String> {
        let Ok(chain) = self.lineage(entity_type) else {
            return Vec::new();
        };
        if let Some(schema) = chain.iter().rev().find(|s| !s.natural_key.is_empty()) {
            return schema.natural_key.clone();
        }
        let mut fields: Vec<String> = Vec::new();
        for schema in &chain {
            for field in &schema.fields {
                if matches!(field.mapping, FieldMapping::Basic | FieldMapping::Guid)
                    && !fields.contains(&field.name)
                {
                    fields.push(field.name.clone());
                }
            }
        }
        fields
    }

    /// Runs hook `name` declared on `declaring_type` against `object`.
    pub fn run_hook(
        &self,
        declaring_type: &str,
        name: &str,
        graph: &mut ObjectGraph,
        object: ObjectId,
    ) -> ModelResult<()> {
        let hook = self
            .hooks
            .get(&(declaring_type.to_string(), name.to_string()))
            .ok_or_else(|| ModelError::UnknownHook {
                entity_type: declaring_type.into(),
                hook: name.into(),
            })?;
        hook.invoke(graph, object)
            .map_err(|reason| ModelError::HookFailed {
                entity_type: declaring_type.into(),
                hook: name.into(),
                reason,
            })
    }
}
