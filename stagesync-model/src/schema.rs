use crate::Container;
use serde::{Deserialize, Serialize};

/// Describes one entity (or value-object) type to the merge engine.
///
/// Schemas are plain data. A subtype names its parent in `extends` and only
/// declares what it adds; the registry resolves the full lineage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySchema {
    pub entity_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
    /// Hooks run on the target after a merge, in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post_load: Vec<String>,
    /// Hook run when the engine instantiates a fresh object of this type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_create: Option<String>,
    /// Fields that define equality for identity-less value objects.
    /// Empty means "all basic fields".
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub natural_key: Vec<String>,
}

impl EntitySchema {
    pub fn new(entity_type: &str) -> Self {
        Self {
            entity_type: entity_type.into(),
            extends: None,
            fields: Vec::new(),
            post_load: Vec::new(),
            on_create: None,
            natural_key: Vec::new(),
        }
    }

    #[must_use]
    pub fn extends(mut self, parent: &str) -> Self {
        self.extends = Some(parent.into());
        self
    }

    #[must_use]
    pub fn field(mut self, field: FieldSchema) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn post_load(mut self, hook: &str) -> Self {
        self.post_load.push(hook.into());
        self
    }

    #[must_use]
    pub fn on_create(mut self, hook: &str) -> Self {
        self.on_create = Some(hook.into());
        self
    }

    #[must_use]
    pub fn natural_key(mut self, fields: &[&str]) -> Self {
        self.natural_key = fields.iter().map(|f| (*f).to_string()).collect();
        self
    }

    /// Looks up a field declared directly on this type.
    pub fn field_named(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The field holding this type's GUID, if it declares one itself.
    pub fn guid_field(&self) -> Option<&FieldSchema> {
        self.fields
            .iter()
            .find(|f| matches!(f.mapping, FieldMapping::Guid))
    }
}

/// One logical attribute (a getter/setter pair) of an entity type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    pub mapping: FieldMapping,
    /// `false` models a getter without a setter.
    #[serde(default = "default_writable", skip_serializing_if = "is_writable")]
    pub writable: bool,
}

fn default_writable() -> bool {
    true
}

fn is_writable(writable: &bool) -> bool {
    *writable
}

impl FieldSchema {
    fn simple(name: &str, mapping: FieldMapping) -> Self {
        Self {
            name: name.into(),
            mapping,
            writable: true,
        }
    }

    /// Store-owned surrogate key. Never merged.
    pub fn id(name: &str) -> Self {
        Self::simple(name, FieldMapping::Id)
    }

    /// Optimistic-lock version column. Never merged.
    pub fn version(name: &str) -> Self {
        Self::simple(name, FieldMapping::Version)
    }

    /// The stable cross-store identity. Merged like a basic field.
    pub fn guid(name: &str) -> Self {
        Self::simple(name, FieldMapping::Guid)
    }

    /// A persisted scalar.
    pub fn basic(name: &str) -> Self {
        Self::simple(name, FieldMapping::Basic)
    }

    /// A non-persisted attribute. Ignored by the merge.
    pub fn transient(name: &str) -> Self {
        Self::simple(name, FieldMapping::Transient)
    }

    /// A nullable reference to another entity.
    pub fn to_one(name: &str, target: &str) -> Self {
        Self::simple(
            name,
            FieldMapping::ToOne {
                target: target.into(),
            },
        )
    }

    pub fn list(name: &str, target: &str) -> Self {
        Self::to_many(name, Some(target), ContainerKind::List, None)
    }

    pub fn set(name: &str, target: &str) -> Self {
        Self::to_many(name, Some(target), ContainerKind::Set, None)
    }

    /// A map keyed by `map_key` on the element (by element GUID when `None`).
    pub fn map(name: &str, target: &str, map_key: Option<&str>) -> Self {
        Self::to_many(name, Some(target), ContainerKind::Map, map_key)
    }

    /// A to-many association. `target` may be left undeclared, which the
    /// merge engine rejects once it needs to classify the elements.
    pub fn to_many(
        name: &str,
        target: Option<&str>,
        container: ContainerKind,
        map_key: Option<&str>,
    ) -> Self {
        Self::simple(
            name,
            FieldMapping::ToMany(ToManyMapping {
                target: target.map(Into::into),
                container,
                map_key: map_key.map(Into::into),
            }),
        )
    }

    /// Marks the field as having no setter.
    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.writable = false;
        self
    }
}

/// How a field is persisted, which decides how the engine merges it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldMapping {
    Id,
    Version,
    Guid,
    Basic,
    Transient,
    ToOne { target: String },
    ToMany(ToManyMapping),
}

/// Metadata of a to-many association.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToManyMapping {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    pub container: ContainerKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_key: Option<String>,
}

/// The shape of a to-many container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    List,
    Set,
    Map,
}

impl ContainerKind {
    /// An empty container of this kind.
    pub fn empty(self) -> Container {
        match self {
            Self::List => Container::List(Vec::new()),
            Self::Set => Container::Set(Vec::new()),
            Self::Map => Container::Map(Default::default()),
        }
    }
}
